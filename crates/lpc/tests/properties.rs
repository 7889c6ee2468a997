use lpc::{
    highlights, lex, parse_source, resolve, suggestions, LexOptions, NoContexts, Node,
    ParseOptions, TokenKind,
};
use proptest::prelude::*;

const FRAGMENTS: &[&str] = &[
    "int", "string", "object", "void", "mapping", "private", "static", "inherit", "#include",
    "class", "let", "if", "else", "while", "for", "foreach", "switch", "case", "default",
    "return", "try", "catch", "new", "operator", "nil", "this", "x", "y", "f", "\"/std/room\"",
    "1", "2.5", "'c'", "#'g'", "(", ")", "{", "}", "[", "]", "({", "([", ";", ",", ":", "::",
    "->", ".", "..", "...", "=", "+=", "+", "*", "<", ">", "?", "!", "++", "is", "/*", "*/",
    "//", "\n",
];

fn lpc_soup() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..48)
        .prop_map(|parts| parts.join(" "))
}

fn any_source() -> impl Strategy<Value = String> {
    prop_oneof![".*", lpc_soup()]
}

fn expression() -> impl Strategy<Value = String> {
    let leaf = prop::sample::select(vec!["x", "y", "1", "2.5", "\"s\"", "'c'", "nil", ""])
        .prop_map(str::to_string);
    let chain = (leaf.clone(), 1usize..160).prop_map(|(term, n)| vec![term; n].join(" + "));
    prop_oneof![leaf, chain].prop_recursive(12, 512, 8, |inner| {
        let operator = prop::sample::select(vec!["+", "*", "<", "&&", "=", "->", "::", "?"]);
        prop_oneof![
            inner.clone().prop_map(|e| format!("({e})")),
            inner.clone().prop_map(|e| format!("-{e}")),
            inner.clone().prop_map(|e| format!("!{e}++")),
            (inner.clone(), operator, inner.clone())
                .prop_map(|(left, op, right)| format!("{left} {op} {right}")),
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|args| format!("f({})", args.join(", "))),
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|items| format!("({{ {} }})", items.join(", "))),
            (inner.clone(), inner).prop_map(|(array, index)| format!("{array}[{index}]")),
        ]
    })
}

/// Expressions placed where declarations, statements and initializers
/// expect them, with an optional truncation to leave constructs open.
fn nested_program() -> impl Strategy<Value = String> {
    (expression(), expression(), any::<bool>()).prop_map(|(init, body, cut)| {
        let program = format!(
            "int x = {init};\nint f(int a) {{\n  if ({body}) return a;\n  x = {body};\n}}\n"
        );
        if cut {
            program[..program.len() / 2].to_string()
        } else {
            program
        }
    })
}

fn assert_nested(node: &Node, len: usize) -> Result<(), TestCaseError> {
    prop_assert!(node.begin <= node.end, "{node:?}");
    prop_assert!(node.end <= len, "{} > {len}", node.end);
    for child in node.children() {
        prop_assert!(
            node.begin <= child.begin && child.end <= node.end,
            "child {}..{} outside parent {}..{}",
            child.begin,
            child.end,
            node.begin,
            node.end
        );
        assert_nested(child, len)?;
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn lexing_is_total_and_eof_terminated(src in any_source()) {
        let tokens = lex(&src, LexOptions { emit_comments: true });
        prop_assert_eq!(tokens.last().map(|token| token.kind), Some(TokenKind::Eof));
        let mut last_end = 0;
        for token in &tokens {
            prop_assert!(token.begin <= token.end && token.end <= src.len());
            prop_assert!(token.begin >= last_end, "overlapping token {token:?}");
            last_end = token.end;
        }
    }

    #[test]
    fn parsing_is_total_with_nested_spans(src in any_source()) {
        let parsed = parse_source(&src, ParseOptions::editor());
        let mut last_begin = 0;
        for node in &parsed.nodes {
            prop_assert!(node.begin >= last_begin);
            last_begin = node.begin;
            assert_nested(node, src.len())?;
        }
    }

    #[test]
    fn parsing_is_idempotent(src in any_source()) {
        let first = parse_source(&src, ParseOptions::editor());
        let second = parse_source(&src, ParseOptions::editor());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn consumers_accept_any_forest(src in lpc_soup(), cursor in 0usize..512) {
        let parsed = parse_source(&src, ParseOptions::editor());
        let tree = resolve(&parsed.nodes, Some("/fuzz"), &NoContexts).tree;
        let pos = cursor.min(src.len());
        let found = highlights(&parsed);
        prop_assert!(found.windows(2).all(|pair| pair[0].begin <= pair[1].begin));
        let _ = suggestions(&parsed, &tree, pos);
        let _ = tree.visible_definitions(pos);
        let _ = tree.query_enclosing_function(pos);
    }

    #[test]
    fn consumers_accept_nested_expressions(src in nested_program(), cursor in 0usize..4096) {
        let parsed = parse_source(&src, ParseOptions::editor());
        for node in &parsed.nodes {
            assert_nested(node, src.len())?;
        }
        let tree = resolve(&parsed.nodes, Some("/nested"), &NoContexts).tree;
        let pos = cursor.min(src.len());
        let found = highlights(&parsed);
        prop_assert!(found.windows(2).all(|pair| pair[0].begin <= pair[1].begin));
        let _ = suggestions(&parsed, &tree, pos);
        let _ = tree.visible_definitions(pos);
        let _ = tree.query_enclosing_function(pos);
    }
}
