use std::collections::HashSet;

use serde::Serialize;

use crate::ast::{node_path_at, Modifier, Node, NodeKind};
use crate::context::{ContextProvider, ContextTree, Definition, DefinitionKind, NoContexts};
use crate::parser::Parsed;
use crate::syntax;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Function,
    Variable,
    Parameter,
    Class,
    Keyword,
    Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub label: String,
    pub kind: SuggestionKind,
    /// The definition's type, as written in source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Suggestion {
    fn from_definition(definition: &Definition) -> Self {
        let kind = match definition.kind {
            DefinitionKind::Function { .. } => SuggestionKind::Function,
            DefinitionKind::Variable => SuggestionKind::Variable,
            DefinitionKind::Parameter => SuggestionKind::Parameter,
            DefinitionKind::Class => SuggestionKind::Class,
        };
        Self {
            label: definition.name.clone(),
            kind,
            detail: Some(definition.value_type().to_string()),
        }
    }
}

/// Completion candidates at `pos`: visible definitions, then keywords and
/// type keywords, all filtered by the identifier typed before `pos`.
pub fn suggestions(parsed: &Parsed, tree: &ContextTree, pos: usize) -> Vec<Suggestion> {
    suggestions_with(parsed, tree, pos, &NoContexts)
}

/// Like [`suggestions`]; after `->` or `.` the receiver's program is looked
/// up through `provider` and its public functions are offered instead.
pub fn suggestions_with(
    parsed: &Parsed,
    tree: &ContextTree,
    pos: usize,
    provider: &dyn ContextProvider,
) -> Vec<Suggestion> {
    let path = node_path_at(&parsed.nodes, pos);
    let prefix = typed_prefix(&path, pos);

    if let Some(receiver) = member_receiver(&path, pos) {
        return member_suggestions(tree, receiver, pos, prefix, provider);
    }

    let expected = path
        .iter()
        .any(|node| matches!(node.kind, NodeKind::Return { .. }))
        .then(|| tree.query_enclosing_function(pos))
        .flatten()
        .map(|function| function.return_type.clone());

    let mut ranked: Vec<(bool, Suggestion)> = tree
        .visible_definitions(pos)
        .into_iter()
        .filter(|definition| definition.name.starts_with(prefix))
        .map(|definition| {
            let fits = expected.as_ref().is_some_and(|expected| {
                expected.is_assignable_in(&definition.value_type(), tree.file_name())
            });
            (fits, Suggestion::from_definition(definition))
        })
        .collect();
    // Stable: visible_definitions already lists inner scopes first.
    ranked.sort_by_key(|(fits, _)| !fits);

    let mut seen: HashSet<String> = ranked
        .iter()
        .map(|(_, suggestion)| suggestion.label.clone())
        .collect();
    let mut out: Vec<Suggestion> = ranked.into_iter().map(|(_, suggestion)| suggestion).collect();
    for (text, kind) in syntax::KEYWORDS {
        if !text.starts_with(prefix) || !seen.insert(text.to_string()) {
            continue;
        }
        out.push(Suggestion {
            label: text.to_string(),
            kind: if kind.is_type_keyword() {
                SuggestionKind::Type
            } else {
                SuggestionKind::Keyword
            },
            detail: None,
        });
    }
    out
}

/// The part of the identifier under the cursor that precedes `pos`.
fn typed_prefix<'a>(path: &[&'a Node], pos: usize) -> &'a str {
    let Some(&node) = path.last() else {
        return "";
    };
    let NodeKind::Name { name } = &node.kind else {
        return "";
    };
    name.get(..pos.saturating_sub(node.begin)).unwrap_or(name)
}

/// The receiver of a member access whose name is under the cursor.
fn member_receiver<'a>(path: &[&'a Node], pos: usize) -> Option<&'a Node> {
    path.iter().rev().find_map(|node| match &node.kind {
        NodeKind::MemberAccess { receiver, name, .. } if name.contains(pos) => {
            Some(receiver.as_ref())
        }
        _ => None,
    })
}

fn member_suggestions(
    tree: &ContextTree,
    receiver: &Node,
    pos: usize,
    prefix: &str,
    provider: &dyn ContextProvider,
) -> Vec<Suggestion> {
    let Some(Type::Basic {
        type_file: Some(file),
        ..
    }) = receiver_type(tree, receiver, pos)
    else {
        return Vec::new();
    };
    let Some(program) = provider.context_for(&file) else {
        tracing::debug!(file = %file, "receiver program not loaded");
        return Vec::new();
    };
    let mut out: Vec<Suggestion> = program
        .top_level_definitions()
        .filter(|definition| {
            definition.is_function()
                && definition.name.starts_with(prefix)
                && !definition.has_modifier(Modifier::Private)
                && !definition.has_modifier(Modifier::Protected)
        })
        .map(Suggestion::from_definition)
        .collect();
    out.sort_by(|a, b| a.label.cmp(&b.label));
    out
}

fn receiver_type(tree: &ContextTree, receiver: &Node, pos: usize) -> Option<Type> {
    let receiver = receiver.primary();
    match &receiver.kind {
        NodeKind::Name { .. } => tree.type_of_name(receiver, pos),
        NodeKind::This => Some(Type::This.resolve_this(tree.file_name())),
        NodeKind::StringLiteral(path) => Some(Type::object(path.clone())),
        NodeKind::FunctionCall { callee, .. } => match tree.type_of_name(callee, pos)? {
            Type::FunctionReference { return_type, .. } => Some(*return_type),
            _ => None,
        },
        NodeKind::Cast { ty, .. } => Some(Type::from_node(ty)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::context::resolve;
    use crate::parser::{parse_source, ParseOptions};

    fn complete(src: &str, pos: usize) -> Vec<Suggestion> {
        let parsed = parse_source(src, ParseOptions::editor());
        let tree = resolve(&parsed.nodes, Some("/a"), &NoContexts).tree;
        suggestions(&parsed, &tree, pos)
    }

    fn labels(found: &[Suggestion]) -> Vec<&str> {
        found.iter().map(|suggestion| suggestion.label.as_str()).collect()
    }

    #[test]
    fn prefix_filters_definitions_and_keywords() {
        let src = "int counter; void reset() { co";
        let found = complete(src, src.len());
        let found = labels(&found);
        assert_eq!(found, vec!["counter", "continue"]);
    }

    #[test]
    fn locals_come_before_globals() {
        let src = "int total; void f(int amount) { int tally; t";
        let found = complete(src, src.len());
        let labels = labels(&found);
        let tally = labels.iter().position(|label| *label == "tally");
        let total = labels.iter().position(|label| *label == "total");
        assert!(tally < total, "{labels:?}");
        assert!(labels.contains(&"try"));
        assert!(labels.contains(&"true"));
    }

    #[test]
    fn return_values_matching_the_result_type_rank_first() {
        let src = "string name; int age; int f() { return a";
        let found = complete(src, src.len());
        assert_eq!(found.first().map(|s| s.label.as_str()), Some("age"));

        let src = "string alpha; int apple; string f() { return a";
        let found = complete(src, src.len());
        assert_eq!(found.first().map(|s| s.label.as_str()), Some("alpha"));
        assert_eq!(found.first().and_then(|s| s.detail.as_deref()), Some("string"));
    }

    #[test]
    fn empty_prefix_offers_everything_visible() {
        let src = "void helper(); void f() { ";
        let found = complete(src, src.len());
        let labels = labels(&found);
        assert!(labels.contains(&"helper"));
        assert!(labels.contains(&"f"));
        assert!(labels.contains(&"mapping"));
        assert!(found
            .iter()
            .any(|s| s.label == "helper" && s.kind == SuggestionKind::Function));
    }

    #[test]
    fn member_access_lists_public_functions_of_the_receiver() {
        let room = parse_source(
            "void create() { } void describe() { } private void secret() { } int depth;",
            ParseOptions::interpretation(),
        );
        let room_tree = resolve(&room.nodes, Some("/std/room"), &NoContexts).tree;
        let mut provider: HashMap<String, Arc<ContextTree>> = HashMap::new();
        provider.insert("/std/room".to_string(), Arc::new(room_tree));

        let src = "void f(object<\"/std/room\"> r) { r->d";
        let parsed = parse_source(src, ParseOptions::editor());
        let tree = resolve(&parsed.nodes, Some("/a"), &provider).tree;
        let found = suggestions_with(&parsed, &tree, src.len(), &provider);
        assert_eq!(labels(&found), vec!["describe"]);

        let src = "void f(object<\"/std/room\"> r) { r->";
        let parsed = parse_source(src, ParseOptions::editor());
        let tree = resolve(&parsed.nodes, Some("/a"), &provider).tree;
        let found = suggestions_with(&parsed, &tree, src.len(), &provider);
        assert_eq!(labels(&found), vec!["create", "describe"]);
    }
}
