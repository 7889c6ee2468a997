use lpc::{suggestions_with, ContextProvider, SuggestionKind};
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind};

use crate::backend::Backend;
use crate::state::DocumentState;

impl Backend {
    pub(crate) fn build_completion_items(
        document: &DocumentState,
        offset: usize,
        provider: &dyn ContextProvider,
    ) -> Vec<CompletionItem> {
        suggestions_with(&document.parsed, &document.tree, offset, provider)
            .into_iter()
            .enumerate()
            .map(|(rank, suggestion)| CompletionItem {
                label: suggestion.label,
                kind: Some(match suggestion.kind {
                    SuggestionKind::Function => CompletionItemKind::FUNCTION,
                    SuggestionKind::Variable => CompletionItemKind::VARIABLE,
                    SuggestionKind::Parameter => CompletionItemKind::VARIABLE,
                    SuggestionKind::Class => CompletionItemKind::CLASS,
                    SuggestionKind::Keyword => CompletionItemKind::KEYWORD,
                    SuggestionKind::Type => CompletionItemKind::TYPE_PARAMETER,
                }),
                detail: suggestion.detail,
                // Keep the ranking instead of the client's alphabetical order.
                sort_text: Some(format!("{rank:05}")),
                ..CompletionItem::default()
            })
            .collect()
    }
}
