use lpc::context::Instruction;
use lpc::LineIndex;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString};

use crate::backend::Backend;
use crate::state::DocumentState;

pub(crate) const CODE_UNRESOLVED: &str = "R001";

impl Backend {
    /// Syntax holes as errors, plus a warning on every `inherit`/`#include`
    /// whose target could not be loaded.
    pub(crate) fn build_diagnostics(document: &DocumentState) -> Vec<Diagnostic> {
        let index = LineIndex::new(&document.text);
        let mut out: Vec<Diagnostic> = lpc::diagnostics(&document.parsed, &document.text)
            .into_iter()
            .map(|diagnostic| Diagnostic {
                range: Self::range(&index, diagnostic.begin, diagnostic.end),
                severity: Some(DiagnosticSeverity::ERROR),
                code: Some(NumberOrString::String(diagnostic.code)),
                code_description: None,
                source: Some("lpc".to_string()),
                message: diagnostic.message,
                related_information: None,
                tags: None,
                data: None,
            })
            .collect();

        let root = document.tree.context(document.tree.root());
        for (offset, instruction) in &root.instructions {
            let (Instruction::Include { path } | Instruction::Inherit { path }) = instruction
            else {
                continue;
            };
            if !document.missing.contains(path) {
                continue;
            }
            let line_end = document
                .text
                .get(*offset..)
                .and_then(|rest| rest.find('\n'))
                .map_or(document.text.len(), |len| offset + len);
            out.push(Diagnostic {
                range: Self::range(&index, *offset, line_end),
                severity: Some(DiagnosticSeverity::WARNING),
                code: Some(NumberOrString::String(CODE_UNRESOLVED.to_string())),
                code_description: None,
                source: Some("lpc".to_string()),
                message: format!("cannot find {path:?}"),
                related_information: None,
                tags: None,
                data: None,
            });
        }
        out
    }
}
