#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 32 * 1024 {
        return;
    }
    let src = lpc::decode_source(data);
    let parsed = lpc::parse_source(&src, lpc::ParseOptions::editor());
    let resolution = lpc::resolve(&parsed.nodes, Some("/fuzz"), &lpc::NoContexts);
    let _ = lpc::highlights(&parsed);
    let _ = lpc::diagnostics(&parsed, &src);

    // Probe completion at a few cursor positions, including the end.
    let step = (src.len() / 8).max(1);
    for pos in (0..=src.len()).step_by(step) {
        let _ = lpc::suggestions(&parsed, &resolution.tree, pos);
    }
});
