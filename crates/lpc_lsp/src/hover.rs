use lpc::{node_path_at, Definition, DefinitionKind, LineIndex, NodeKind};
use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind};

use crate::backend::Backend;
use crate::state::DocumentState;

impl Backend {
    pub(crate) fn build_hover(document: &DocumentState, offset: usize) -> Option<Hover> {
        let path = node_path_at(&document.parsed.nodes, offset);
        let (depth, node) = path
            .iter()
            .enumerate()
            .rev()
            .find(|(_, node)| matches!(node.kind, NodeKind::Name { .. }))?;
        let name = node.name_text()?;
        let tree = &document.tree;

        let parent = depth.checked_sub(1).and_then(|index| path.get(index));
        let found = match parent.map(|parent| &parent.kind) {
            Some(NodeKind::ScopeChain { scope, name: member }) if member.begin == node.begin => {
                match scope.as_deref().and_then(|scope| scope.name_text()) {
                    Some(label) => tree.get_labelled_identifiers(label, name),
                    None => tree.get_super_identifiers(name),
                }
            }
            Some(NodeKind::MemberAccess { name: member, .. }) if member.begin == node.begin => {
                return None;
            }
            _ => tree.get_identifiers(tree.scope_at(offset), name, node.end, true, true),
        };
        let definition = found.first()?;

        let index = LineIndex::new(&document.text);
        Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: format!("```lpc\n{}\n```", Self::signature(definition)),
            }),
            range: Some(Self::range(&index, node.begin, node.end)),
        })
    }

    pub(crate) fn signature(definition: &Definition) -> String {
        let mut out = String::new();
        for modifier in &definition.modifiers {
            out.push_str(modifier.as_str());
            out.push(' ');
        }
        match &definition.kind {
            DefinitionKind::Function {
                parameters,
                variadic,
            } => {
                let parameters: Vec<String> =
                    parameters.iter().map(|parameter| parameter.to_string()).collect();
                out.push_str(&format!(
                    "{} {}({}{})",
                    definition.return_type,
                    definition.name,
                    parameters.join(", "),
                    if *variadic { "..." } else { "" }
                ));
            }
            DefinitionKind::Class => {
                out.push_str(&format!("class {}", definition.name));
            }
            DefinitionKind::Variable | DefinitionKind::Parameter => {
                out.push_str(&format!("{} {}", definition.return_type, definition.name));
            }
        }
        out
    }
}
