use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use lpc::{parse_source, resolve, ContextProvider, ContextTree, ParseOptions, Parsed};
use tower_lsp::lsp_types::Url;

use crate::settings::Settings;

/// An open document and everything derived from its current text.
pub(crate) struct DocumentState {
    pub(crate) name: String,
    pub(crate) text: String,
    pub(crate) version: Option<i32>,
    pub(crate) parsed: Parsed,
    pub(crate) tree: Arc<ContextTree>,
    /// Dependencies that stayed unresolved after a load attempt.
    pub(crate) missing: Vec<String>,
}

impl DocumentState {
    /// Parses and resolves `text`; also returns the dependencies the
    /// provider could not supply yet.
    pub(crate) fn analyze(
        name: String,
        text: String,
        version: Option<i32>,
        provider: &dyn ContextProvider,
    ) -> (Self, Vec<String>) {
        let parsed = parse_source(&text, ParseOptions::editor());
        let resolution = resolve(&parsed.nodes, Some(&name), provider);
        let document = Self {
            name,
            text,
            version,
            parsed,
            tree: Arc::new(resolution.tree),
            missing: Vec::new(),
        };
        (document, resolution.unresolved)
    }

    /// Resolves the current parse again, e.g. after dependencies loaded.
    pub(crate) fn reresolve(&mut self, provider: &dyn ContextProvider) {
        let resolution = resolve(&self.parsed.nodes, Some(&self.name), provider);
        self.tree = Arc::new(resolution.tree);
        self.missing = resolution.unresolved;
    }
}

#[derive(Default)]
pub(crate) struct BackendState {
    pub(crate) documents: HashMap<Url, DocumentState>,
    pub(crate) workspace_root: Option<PathBuf>,
    pub(crate) settings: Settings,
}

impl BackendState {
    /// Open documents that include or inherit `name`, directly or through
    /// programs `provider` has resolved.
    pub(crate) fn dependents_of(&self, name: &str, provider: &dyn ContextProvider) -> Vec<Url> {
        let mut dependents: Vec<Url> = self
            .documents
            .iter()
            .filter(|(_, document)| document.name != name)
            .filter(|(_, document)| Self::reaches(&document.tree, name, provider))
            .map(|(uri, _)| uri.clone())
            .collect();
        dependents.sort();
        dependents
    }

    fn reaches(tree: &ContextTree, name: &str, provider: &dyn ContextProvider) -> bool {
        let mut seen = HashSet::new();
        let mut pending = tree.dependencies();
        while let Some(dependency) = pending.pop() {
            if dependency == name {
                return true;
            }
            if !seen.insert(dependency.clone()) {
                continue;
            }
            if let Some(tree) = provider.context_for(&dependency) {
                pending.extend(tree.dependencies());
            }
        }
        false
    }
}
