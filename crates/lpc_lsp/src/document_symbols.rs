use lpc::{DefinitionKind, LineIndex};
use tower_lsp::lsp_types::{DocumentSymbol, SymbolKind};

use crate::backend::Backend;
use crate::state::DocumentState;

impl Backend {
    #[allow(deprecated)]
    pub(crate) fn build_document_symbols(document: &DocumentState) -> Vec<DocumentSymbol> {
        let index = LineIndex::new(&document.text);
        document
            .tree
            .top_level_definitions()
            .map(|definition| {
                let kind = match definition.kind {
                    DefinitionKind::Function { .. } => SymbolKind::FUNCTION,
                    DefinitionKind::Class => SymbolKind::CLASS,
                    DefinitionKind::Variable | DefinitionKind::Parameter => SymbolKind::VARIABLE,
                };
                let range = Self::range(&index, definition.begin, definition.end);
                DocumentSymbol {
                    name: definition.name.clone(),
                    detail: Some(Self::signature(definition)),
                    kind,
                    tags: None,
                    deprecated: None,
                    range,
                    selection_range: range,
                    children: None,
                }
            })
            .collect()
    }
}
