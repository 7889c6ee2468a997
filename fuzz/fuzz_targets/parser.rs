#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Avoid pathological allocations in the harness itself; libFuzzer will still mutate below this.
    if data.len() > 64 * 1024 {
        return;
    }
    let src = lpc::decode_source(data);
    let tokens = lpc::lex(&src, lpc::LexOptions { emit_comments: true });
    assert!(tokens.windows(2).all(|pair| pair[0].end <= pair[1].begin));

    for options in [lpc::ParseOptions::interpretation(), lpc::ParseOptions::editor()] {
        let parsed = lpc::parse_source(&src, options);
        for node in &parsed.nodes {
            assert!(node.begin <= node.end && node.end <= src.len());
        }
    }
});
