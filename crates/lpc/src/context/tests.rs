use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::BasicKind;
use crate::parser::{parse_source, ParseOptions};
use crate::types::Type;

use super::{resolve, ContextProvider, ContextTree, DefinitionKind, NoContexts, Resolution};

fn build(src: &str, file: &str, provider: &dyn ContextProvider) -> Resolution {
    let parsed = parse_source(src, ParseOptions::interpretation());
    resolve(&parsed.nodes, Some(file), provider)
}

fn names_at(tree: &ContextTree, name: &str, pos: usize) -> usize {
    let scope = tree.scope_at(pos);
    tree.get_identifiers(scope, name, pos, false, true).len()
}

#[test]
fn parameters_are_visible_throughout_the_body() {
    let src = "void f(int x){ int y; }";
    let tree = build(src, "/a.c", &NoContexts).tree;
    let body_start = src.find('{').unwrap_or(0) + 1;
    let before_y = src.find("int y").unwrap_or(0);
    let after_y = src.find(';').unwrap_or(0) + 1;

    assert_eq!(names_at(&tree, "x", body_start), 1);
    assert_eq!(names_at(&tree, "x", after_y), 1);
    assert_eq!(names_at(&tree, "y", before_y), 0);
    assert_eq!(names_at(&tree, "y", after_y), 1);
    // Outside the body neither local is visible.
    assert_eq!(names_at(&tree, "x", src.len()), 0);
    assert_eq!(names_at(&tree, "f", src.len()), 1);
}

#[test]
fn inner_definitions_shadow_outer_ones() {
    let src = "int v; void f() { string v; return; }";
    let tree = build(src, "/a.c", &NoContexts).tree;
    let pos = src.find("return").unwrap_or(0);
    let scope = tree.scope_at(pos);
    let found = tree.get_identifiers(scope, "v", pos, false, true);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].return_type, Type::basic(BasicKind::String));

    let visible = tree.visible_definitions(pos);
    let v_types: Vec<&Type> = visible
        .iter()
        .filter(|definition| definition.name == "v")
        .map(|definition| &definition.return_type)
        .collect();
    assert_eq!(v_types, vec![&Type::basic(BasicKind::String)]);
}

#[test]
fn inherited_definitions_resolve_at_any_position() {
    let base = build("int z; private int hidden; protected int shared;", "/b.c", &NoContexts);
    assert!(base.unresolved.is_empty());
    let mut provider: HashMap<String, Arc<ContextTree>> = HashMap::new();
    provider.insert("/b".to_string(), Arc::new(base.tree));

    let derived = build("inherit \"/b\";\nvoid g() { }", "/a.c", &provider);
    assert!(derived.unresolved.is_empty());
    let tree = derived.tree;
    let found = tree.get_identifiers(tree.root(), "z", usize::MAX, false, false);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "z");

    assert!(tree
        .get_identifiers(tree.root(), "hidden", usize::MAX, false, true)
        .is_empty());
    assert_eq!(
        tree.get_identifiers(tree.root(), "hidden", usize::MAX, true, true)
            .len(),
        1
    );
    assert!(tree
        .get_identifiers(tree.root(), "shared", usize::MAX, false, false)
        .is_empty());
    assert_eq!(tree.get_super_identifiers("shared").len(), 1);
    assert_eq!(tree.get_labelled_identifiers("b", "z").len(), 1);
}

#[test]
fn inheritance_chains_are_followed() {
    let c = build("int deep;", "/c.c", &NoContexts);
    let mut provider: HashMap<String, Arc<ContextTree>> = HashMap::new();
    provider.insert("/c".to_string(), Arc::new(c.tree));
    let b = build("inherit \"/c\";", "/b.c", &provider);
    provider.insert("/b".to_string(), Arc::new(b.tree));
    let a = build("inherit \"/b\";", "/a.c", &provider).tree;
    assert_eq!(a.get_super_identifiers("deep").len(), 1);
    assert!(a
        .visible_definitions(usize::MAX)
        .iter()
        .any(|definition| definition.name == "deep"));
}

#[test]
fn includes_are_searched_before_inherits() {
    let header = build("int limit;", "/sys/limits.h", &NoContexts);
    let base = build("string limit;", "/base.c", &NoContexts);
    let mut provider: HashMap<String, Arc<ContextTree>> = HashMap::new();
    provider.insert("limits.h".to_string(), Arc::new(header.tree));
    provider.insert("/base".to_string(), Arc::new(base.tree));
    let tree = build(
        "inherit \"/base\";\n#include \"limits.h\"\nvoid f() { }",
        "/a.c",
        &provider,
    )
    .tree;
    let found = tree.get_identifiers(tree.root(), "limit", 0, false, true);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].return_type, Type::basic(BasicKind::Int));
    assert_eq!(tree.dependencies(), vec!["/base", "limits.h"]);
}

#[test]
fn missing_dependencies_are_reported_once() {
    let resolution = build(
        "inherit \"/missing\";\n#include \"gone.h\"\ninherit \"/missing\";",
        "/a.c",
        &NoContexts,
    );
    assert_eq!(resolution.unresolved, vec!["/missing", "gone.h"]);
}

#[test]
fn enclosing_function_is_found_from_nested_blocks() {
    let src = "int f(int a) { if (a) { return 1; } }\nvoid g() { }";
    let tree = build(src, "/a.c", &NoContexts).tree;
    let inside = src.find("return").unwrap_or(0);
    let function = tree.query_enclosing_function(inside);
    assert_eq!(function.map(|definition| definition.name.as_str()), Some("f"));
    assert!(matches!(
        function.map(|definition| &definition.kind),
        Some(DefinitionKind::Function { parameters, variadic: false }) if parameters.len() == 1
    ));
    assert!(tree.query_enclosing_function(0).is_none());
}

#[test]
fn unclosed_body_extends_to_the_end_of_the_file() {
    let src = "void f(int a) {\n  int b;\n  ";
    let tree = build(src, "/a.c", &NoContexts).tree;
    assert_eq!(names_at(&tree, "a", src.len()), 1);
    assert_eq!(names_at(&tree, "b", src.len()), 1);
    assert!(tree.query_enclosing_function(src.len()).is_some());
}

#[test]
fn let_infers_types_from_values() {
    let src = "void f() { let a = 1; let b = ({ \"x\" }); let c = a + 2.0; let d = b[0]; let e = nil; }";
    let tree = build(src, "/room.c", &NoContexts).tree;
    let pos = src.len() - 1;
    let type_of = |name: &str| {
        let scope = tree.scope_at(pos);
        tree.get_identifiers(scope, name, pos, false, true)
            .first()
            .map(|definition| definition.return_type.to_string())
    };
    assert_eq!(type_of("a").as_deref(), Some("int"));
    assert_eq!(type_of("b").as_deref(), Some("string[]"));
    assert_eq!(type_of("c").as_deref(), Some("float"));
    assert_eq!(type_of("d").as_deref(), Some("string"));
    assert_eq!(
        type_of("e").as_deref(),
        Some("mapping|object|string|symbol")
    );
}

#[test]
fn foreach_variables_take_the_element_type() {
    let src = "void f(string *names) { foreach (let name : names) { return; } }";
    let tree = build(src, "/a.c", &NoContexts).tree;
    let pos = src.find("return").unwrap_or(0);
    let scope = tree.scope_at(pos);
    let found = tree.get_identifiers(scope, "name", pos, false, true);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].return_type, Type::basic(BasicKind::String));
}

#[test]
fn catch_variable_is_scoped_to_the_statement() {
    let src = "void f() { try { } catch (exception e) { return; } }";
    let tree = build(src, "/a.c", &NoContexts).tree;
    let inside = src.find("return").unwrap_or(0);
    assert_eq!(names_at(&tree, "e", inside), 1);
    assert_eq!(names_at(&tree, "e", src.len() - 1), 0);
}

#[test]
fn this_resolves_to_the_current_file() {
    let src = "void f() { let me = this; }";
    let tree = build(src, "/std/room", &NoContexts).tree;
    let pos = src.len() - 1;
    let scope = tree.scope_at(pos);
    let found = tree.get_identifiers(scope, "me", pos, false, true);
    assert_eq!(found[0].return_type, Type::object("/std/room"));
}

#[test]
fn private_members_do_not_hide_inherited_ones() {
    let c = build("int z; protected int level;", "/c.c", &NoContexts);
    let mut provider: HashMap<String, Arc<ContextTree>> = HashMap::new();
    provider.insert("/c".to_string(), Arc::new(c.tree));
    let b = build(
        "inherit \"/c\";\nprivate string z; private int level;",
        "/b.c",
        &provider,
    );
    provider.insert("/b".to_string(), Arc::new(b.tree));
    let a = build("inherit \"/b\";\nvoid f() { }", "/a.c", &provider).tree;

    let found = a.get_super_identifiers("z");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].return_type, Type::basic(BasicKind::Int));

    let found = a.get_identifiers(a.root(), "level", usize::MAX, false, true);
    assert_eq!(found.len(), 1);
    assert!(found[0].has_modifier(crate::ast::Modifier::Protected));
    assert!(a
        .get_identifiers(a.root(), "level", usize::MAX, false, false)
        .is_empty());
    assert_eq!(
        a.get_labelled_identifiers("b", "z")
            .first()
            .map(|definition| definition.return_type.to_string())
            .as_deref(),
        Some("int")
    );
}

#[test]
fn unclosed_class_body_extends_to_the_end_of_the_file() {
    let src = "class Point {\n  int x;\n  ";
    let tree = build(src, "/a.c", &NoContexts).tree;
    assert_eq!(names_at(&tree, "x", src.len()), 1);
    assert_eq!(names_at(&tree, "Point", src.len()), 1);

    let closed = "class Point { int x; }\n";
    let tree = build(closed, "/a.c", &NoContexts).tree;
    assert_eq!(names_at(&tree, "x", closed.len()), 0);
}

#[test]
fn deep_expressions_resolve_on_a_small_stack() {
    let worker = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let chain = "1 + ".repeat(200);
            let mut nested_last = String::from("1");
            let mut nested_first = String::from("1");
            for _ in 0..100 {
                nested_last = format!("({chain}{nested_last})");
                nested_first = format!("({nested_first} + {chain}1)");
            }
            for expression in [nested_last, nested_first] {
                let src = format!("int x = {expression};\nint y;");
                let parsed = parse_source(&src, ParseOptions::editor());
                let resolution = resolve(&parsed.nodes, Some("/deep.c"), &NoContexts);
                assert_eq!(names_at(&resolution.tree, "x", src.len()), 1);
                assert!(!crate::highlight::highlights(&parsed).is_empty());
                let _ = crate::completion::suggestions(&parsed, &resolution.tree, src.len() / 2);
            }
        })
        .expect("spawn resolver thread");
    worker.join().expect("resolver thread");
}
