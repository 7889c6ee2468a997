use std::path::PathBuf;
use std::sync::Arc;

use lpc::{FileCache, LineIndex};
use tokio::sync::Mutex;
use tower_lsp::lsp_types::{Position, Range, Url};
use tower_lsp::Client;

use crate::state::{BackendState, DocumentState};
use crate::workspace::{program_name, DiskLoader, LocalCompiler};

#[derive(Clone)]
pub(crate) struct Backend {
    pub(crate) client: Client,
    pub(crate) state: Arc<Mutex<BackendState>>,
    pub(crate) cache: Arc<FileCache<DiskLoader>>,
    pub(crate) compiler: Arc<LocalCompiler>,
}

impl Backend {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(BackendState::default())),
            cache: Arc::new(FileCache::new(DiskLoader::default())),
            compiler: Arc::new(LocalCompiler::default()),
        }
    }

    pub(crate) fn range(index: &LineIndex<'_>, begin: usize, end: usize) -> Range {
        let (start_line, start_char) = index.utf16_position(begin);
        let (end_line, end_char) = index.utf16_position(end);
        Range::new(
            Position::new(start_line, start_char),
            Position::new(end_line, end_char),
        )
    }

    pub(crate) fn offset_at(text: &str, position: Position) -> usize {
        LineIndex::new(text).offset_at(position.line, position.character)
    }

    pub(crate) fn path_from_uri(uri: &Url) -> PathBuf {
        uri.to_file_path()
            .unwrap_or_else(|_| PathBuf::from(uri.path()))
    }

    pub(crate) async fn program_name_for(&self, uri: &Url) -> String {
        let root = self.state.lock().await.workspace_root.clone();
        program_name(root.as_deref(), &Self::path_from_uri(uri))
    }

    pub(crate) async fn with_document<R>(
        &self,
        uri: &Url,
        f: impl FnOnce(&DocumentState) -> R,
    ) -> Option<R> {
        let state = self.state.lock().await;
        state.documents.get(uri).map(f)
    }

    /// Re-analyzes `uri` with new text, publishes its diagnostics and starts
    /// loading whatever it includes or inherits that is not cached yet.
    pub(crate) async fn update_document(&self, uri: Url, text: String, version: Option<i32>) {
        let name = self.program_name_for(&uri).await;
        let (document, unresolved) =
            DocumentState::analyze(name, text, version, self.cache.as_ref());
        self.state.lock().await.documents.insert(uri.clone(), document);
        self.publish_diagnostics(&uri).await;
        if !unresolved.is_empty() {
            self.load_dependencies(uri, unresolved);
        }
    }

    fn load_dependencies(&self, uri: Url, names: Vec<String>) {
        let backend = self.clone();
        tokio::spawn(async move {
            let report = backend.cache.load_closure(names).await;
            tracing::debug!(uri = %uri, loaded = ?report.loaded, missing = ?report.missing, "dependencies loaded");
            {
                let mut state = backend.state.lock().await;
                let Some(document) = state.documents.get_mut(&uri) else {
                    return;
                };
                document.reresolve(backend.cache.as_ref());
            }
            backend.publish_diagnostics(&uri).await;
        });
    }

    /// Reloads `name` for the open documents that depend on it and
    /// publishes their refreshed diagnostics.
    pub(crate) fn reanalyze_dependents(&self, name: String) {
        let backend = self.clone();
        tokio::spawn(async move {
            let (uris, dependencies) = {
                let state = backend.state.lock().await;
                let uris = state.dependents_of(&name, backend.cache.as_ref());
                let dependencies: Vec<String> = uris
                    .iter()
                    .filter_map(|uri| state.documents.get(uri))
                    .flat_map(|document| document.tree.dependencies())
                    .collect();
                (uris, dependencies)
            };
            if uris.is_empty() {
                return;
            }
            let report = backend.cache.load_closure(dependencies).await;
            tracing::debug!(name = %name, dependents = uris.len(), missing = ?report.missing, "dependents reanalyzed");
            {
                let mut state = backend.state.lock().await;
                for uri in &uris {
                    if let Some(document) = state.documents.get_mut(uri) {
                        document.reresolve(backend.cache.as_ref());
                    }
                }
            }
            for uri in &uris {
                backend.publish_diagnostics(uri).await;
            }
        });
    }

    pub(crate) async fn publish_diagnostics(&self, uri: &Url) {
        let (diagnostics, version) = {
            let state = self.state.lock().await;
            let Some(document) = state.documents.get(uri) else {
                return;
            };
            let diagnostics = if state.settings.show_diagnostics {
                Self::build_diagnostics(document)
            } else {
                Vec::new()
            };
            (diagnostics, document.version)
        };
        self.client
            .publish_diagnostics(uri.clone(), diagnostics, version)
            .await;
    }

    pub(crate) async fn remove_document(&self, uri: &Url) {
        self.state.lock().await.documents.remove(uri);
    }
}
