use std::collections::HashMap;
use std::sync::Arc;

use lpc::ast::BasicKind;
use lpc::{
    diagnostics, highlights, parse_source, resolve, suggestions, ContextTree, Expected,
    HighlightKind, NoContexts, NodeKind, ParseOptions, Type,
};

const ROOM: &str = r#"#include "config.h"
inherit "/std/room";

/*! Exits keyed by direction. */
private mapping exits;

static void create() {
    ::create();
    exits = ([ "north": "/d/hall" ]);
    foreach (let direction : ({ "north", "south" })) {
        add_exit(direction, exits[direction]);
    }
}

string query_long() {
    return "A dusty room.";
}
"#;

const BASE_ROOM: &str = r#"
protected void add_exit(string direction, string path) { }
void create() { }
private int secret;
"#;

fn provider() -> HashMap<String, Arc<ContextTree>> {
    let base = parse_source(BASE_ROOM, ParseOptions::interpretation());
    let header = parse_source("int MAX_EXITS;", ParseOptions::interpretation());
    let mut provider = HashMap::new();
    provider.insert(
        "/std/room".to_string(),
        Arc::new(resolve(&base.nodes, Some("/std/room"), &NoContexts).tree),
    );
    provider.insert(
        "config.h".to_string(),
        Arc::new(resolve(&header.nodes, Some("config.h"), &NoContexts).tree),
    );
    provider
}

#[test]
fn single_declaration_parses_cleanly() {
    let parsed = parse_source("int x;", ParseOptions::interpretation());
    assert_eq!(parsed.nodes.len(), 1);
    assert!(!parsed.has_holes());
    match &parsed.nodes[0].kind {
        NodeKind::VariableDefinition { ty: Some(ty), name, .. } => {
            assert_eq!(Type::from_node(ty), Type::basic(BasicKind::Int));
            assert_eq!(name.name_text(), Some("x"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn missing_semicolon_becomes_one_hole() {
    let parsed = parse_source("int x", ParseOptions::interpretation());
    let holes = parsed.holes();
    assert_eq!(holes.len(), 1);
    assert!(matches!(
        holes[0].kind,
        NodeKind::Missing {
            expected: Expected::Semicolon,
            ..
        }
    ));
    assert!(matches!(parsed.nodes[0].kind, NodeKind::Combination { .. }));
}

#[test]
fn realistic_room_parses_and_resolves() {
    let parsed = parse_source(ROOM, ParseOptions::editor());
    assert!(diagnostics(&parsed, ROOM).is_empty(), "{:?}", parsed.holes());

    let resolution = resolve(&parsed.nodes, Some("/d/room"), &provider());
    assert!(resolution.unresolved.is_empty());
    let tree = resolution.tree;
    assert_eq!(tree.dependencies(), vec!["config.h", "/std/room"]);

    let inside = ROOM.find("add_exit(").unwrap();
    let scope = tree.scope_at(inside);
    assert_eq!(
        tree.get_identifiers(scope, "add_exit", inside, false, true).len(),
        1
    );
    assert_eq!(
        tree.get_identifiers(scope, "direction", inside, false, true)[0].return_type,
        Type::basic(BasicKind::String)
    );
    assert_eq!(
        tree.get_identifiers(scope, "MAX_EXITS", inside, false, true).len(),
        1
    );
    assert!(tree
        .get_identifiers(scope, "secret", inside, false, true)
        .is_empty());
    assert_eq!(
        tree.query_enclosing_function(inside)
            .map(|function| function.name.as_str()),
        Some("create")
    );
}

#[test]
fn room_highlights_cover_every_category_used() {
    let parsed = parse_source(ROOM, ParseOptions::editor());
    let found = highlights(&parsed);
    let has = |kind: HighlightKind| found.iter().any(|highlight| highlight.kind == kind);
    for kind in [
        HighlightKind::Keyword,
        HighlightKind::Type,
        HighlightKind::Modifier,
        HighlightKind::Function,
        HighlightKind::Variable,
        HighlightKind::Name,
        HighlightKind::String,
        HighlightKind::DocComment,
    ] {
        assert!(has(kind), "no {kind:?} highlight");
    }
    assert!(!has(HighlightKind::Missing) && !has(HighlightKind::Wrong));
}

#[test]
fn completion_sees_inherited_and_local_names() {
    let src = "inherit \"/std/room\";\nvoid reset() { int exit_count; ex";
    let parsed = parse_source(src, ParseOptions::editor());
    let tree = resolve(&parsed.nodes, Some("/d/room"), &provider()).tree;
    let labels: Vec<String> = suggestions(&parsed, &tree, src.len())
        .into_iter()
        .map(|suggestion| suggestion.label)
        .collect();
    assert_eq!(labels, vec!["exit_count", "exception"]);

    let src = "inherit \"/std/room\";\nvoid reset() { add";
    let parsed = parse_source(src, ParseOptions::editor());
    let tree = resolve(&parsed.nodes, Some("/d/room"), &provider()).tree;
    let labels: Vec<String> = suggestions(&parsed, &tree, src.len())
        .into_iter()
        .map(|suggestion| suggestion.label)
        .collect();
    assert_eq!(labels, vec!["add_exit"]);
}

#[test]
fn assignability_examples() {
    let int = Type::basic(BasicKind::Int);
    let string = Type::basic(BasicKind::String);
    assert!(Type::array(int.clone()).is_assignable(&Type::array(int.clone())));
    assert!(!Type::array(int.clone()).is_assignable(&Type::array(string)));
    let fixed = Type::function(Type::void(), vec![int.clone()], false);
    let variadic = Type::function(Type::void(), vec![int], true);
    assert!(fixed.is_assignable(&variadic));
    assert!(!variadic.is_assignable(&fixed));
}

#[test]
fn garbage_is_still_a_forest() {
    for src in ["", "   \n\t", "}}}", ")]};", "@@@ $$$", "int (((", "class {"] {
        let parsed = parse_source(src, ParseOptions::editor());
        for node in &parsed.nodes {
            assert!(node.end <= src.len());
        }
        let _ = resolve(&parsed.nodes, None, &NoContexts);
    }
}

#[test]
fn read_source_decodes_files_leniently() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("latin1.c");
    std::fs::write(&path, [b'i', b'n', b't', 0xe9, b' ', b'x', b';']).expect("write source");

    let text = lpc::read_source(&path).expect("readable");
    assert_eq!(text, "int x;");
    assert!(!parse_source(&text, ParseOptions::interpretation()).has_holes());

    let err = lpc::read_source(dir.path()).expect_err("directories are rejected");
    assert!(matches!(err, lpc::LpcError::InvalidPath(_)));
}
