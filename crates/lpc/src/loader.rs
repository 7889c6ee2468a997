use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::{Mutex, OnceCell};

use crate::context::{resolve, ContextProvider, ContextTree, Resolution};
use crate::parser::{parse_source, ParseOptions, Parsed};

/// Fetches the text of another program. Failures are silent: `None` means
/// the file is not available right now.
pub trait SourceLoader: Send + Sync {
    fn load_source(&self, name: &str) -> impl Future<Output = Option<String>> + Send;
}

/// The driver-side compiler the editor talks to. Every call is fire and
/// forget; results come back through whatever channel the host uses.
pub trait RemoteCompiler: Send + Sync {
    fn can_compile(&self) -> bool;
    fn compile(&self, name: &str);
    fn save(&self, name: &str, content: &str);
}

/// A fetched program: its parse and the tree it resolved to when it was
/// first loaded.
struct Source {
    parsed: Parsed,
    tree: Arc<ContextTree>,
}

type SourceCell = Arc<OnceCell<Arc<Source>>>;

/// What a [`FileCache::load_closure`] call reached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosureReport {
    pub loaded: Vec<String>,
    pub missing: Vec<String>,
}

/// Resolved contexts of other files, keyed by the name used in `inherit`
/// and `#include`. At most one load per name is in flight; concurrent
/// callers wait for it. A failed or abandoned load leaves no entry behind,
/// and a load that an [`invalidate`](FileCache::invalidate) overtook never
/// publishes its tree.
pub struct FileCache<L> {
    loader: L,
    sources: Mutex<HashMap<String, SourceCell>>,
    /// Latest tree per name; written only while `sources` is locked and
    /// only for the cell currently registered under that name.
    trees: RwLock<HashMap<String, Arc<ContextTree>>>,
}

impl<L: SourceLoader> FileCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            sources: Mutex::new(HashMap::new()),
            trees: RwLock::new(HashMap::new()),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Loads and resolves `name`, sharing the work with concurrent callers.
    pub async fn load(&self, name: &str) -> Option<Arc<ContextTree>> {
        let cell = {
            let mut sources = self.sources.lock().await;
            sources.entry(name.to_string()).or_default().clone()
        };
        if let Some(source) = cell.get() {
            return Some(self.context_for(name).unwrap_or_else(|| source.tree.clone()));
        }
        let fetched = AtomicBool::new(false);
        let source = cell
            .get_or_try_init(|| async {
                fetched.store(true, Ordering::Relaxed);
                tracing::debug!(name, "loading source");
                let Some(text) = self.loader.load_source(name).await else {
                    tracing::debug!(name, "source unavailable");
                    return Err(());
                };
                let parsed = parse_source(&text, ParseOptions::interpretation());
                let tree = Arc::new(self.resolve_parsed(name, &parsed).tree);
                Ok(Arc::new(Source { parsed, tree }))
            })
            .await
            .ok()?
            .clone();
        if fetched.load(Ordering::Relaxed) {
            self.publish(name, &cell, source.tree.clone()).await;
            return Some(source.tree.clone());
        }
        tracing::debug!(name, "joined an in-flight load");
        Some(self.context_for(name).unwrap_or_else(|| source.tree.clone()))
    }

    /// Loads `names` and everything they include or inherit, then resolves
    /// the loaded files again so each sees its dependencies. Cycles stop at
    /// the first revisit.
    pub async fn load_closure<I, S>(&self, names: I) -> ClosureReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut report = ClosureReport::default();
        let mut visited = HashSet::new();
        let mut queue: VecDeque<String> = names.into_iter().map(Into::into).collect();
        while let Some(name) = queue.pop_front() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let Some(tree) = self.load(&name).await else {
                report.missing.push(name);
                continue;
            };
            for dependency in tree.dependencies() {
                if !visited.contains(&dependency) {
                    queue.push_back(dependency);
                }
            }
            report.loaded.push(name);
        }
        // Dependencies are discovered after their dependents.
        for name in report.loaded.iter().rev() {
            let Some(cell) = self.sources.lock().await.get(name).cloned() else {
                continue;
            };
            if let Some(source) = cell.get() {
                let tree = Arc::new(self.resolve_parsed(name, &source.parsed).tree);
                self.publish(name, &cell, tree).await;
            }
        }
        tracing::debug!(
            loaded = report.loaded.len(),
            missing = report.missing.len(),
            "closure loaded"
        );
        report
    }

    /// Forgets `name`; the next load fetches it again.
    pub async fn invalidate(&self, name: &str) {
        let mut sources = self.sources.lock().await;
        sources.remove(name);
        if let Ok(mut trees) = self.trees.write() {
            trees.remove(name);
        }
    }

    /// Resolves an already parsed program `name` against what is cached.
    pub fn resolve_parsed(&self, name: &str, parsed: &Parsed) -> Resolution {
        resolve(&parsed.nodes, Some(name), self)
    }

    /// Makes `tree` the cached tree of `name`, unless `cell` was
    /// invalidated since it was handed out.
    async fn publish(&self, name: &str, cell: &SourceCell, tree: Arc<ContextTree>) {
        let sources = self.sources.lock().await;
        let current = sources
            .get(name)
            .is_some_and(|registered| Arc::ptr_eq(registered, cell));
        if !current {
            tracing::debug!(name, "dropping tree of an invalidated load");
            return;
        }
        if let Ok(mut trees) = self.trees.write() {
            trees.insert(name.to_string(), tree);
        }
        drop(sources);
    }
}

impl<L> ContextProvider for FileCache<L> {
    fn context_for(&self, name: &str) -> Option<Arc<ContextTree>> {
        self.trees.read().ok()?.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use super::*;

    #[derive(Default)]
    struct MemoryLoader {
        files: StdMutex<HashMap<String, String>>,
        calls: AtomicUsize,
        fail_first: bool,
    }

    impl MemoryLoader {
        fn with(files: &[(&str, &str)]) -> Self {
            Self {
                files: StdMutex::new(
                    files
                        .iter()
                        .map(|(name, text)| (name.to_string(), text.to_string()))
                        .collect(),
                ),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SourceLoader for MemoryLoader {
        fn load_source(&self, name: &str) -> impl Future<Output = Option<String>> + Send {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let text = self.files.lock().unwrap().get(name).cloned();
            let text = if self.fail_first && call == 0 { None } else { text };
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                text
            }
        }
    }

    #[tokio::test]
    async fn concurrent_loads_share_one_fetch() {
        let cache = FileCache::new(MemoryLoader::with(&[("/a", "int x;")]));
        let (a, b, c) = tokio::join!(cache.load("/a"), cache.load("/a"), cache.load("/a"));
        assert_eq!(cache.loader().calls(), 1);
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert!(Arc::ptr_eq(&a, &b) && Arc::ptr_eq(&b, &c));
        assert_eq!(a.top_level_definitions().count(), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let mut loader = MemoryLoader::with(&[("/a", "int x;")]);
        loader.fail_first = true;
        let cache = FileCache::new(loader);
        assert!(cache.load("/a").await.is_none());
        assert!(cache.context_for("/a").is_none());
        assert!(cache.load("/a").await.is_some());
        assert_eq!(cache.loader().calls(), 2);
    }

    #[tokio::test]
    async fn abandoned_loads_leave_the_cache_usable() {
        let cache = FileCache::new(MemoryLoader::with(&[("/a", "int x;")]));
        let abandoned =
            tokio::time::timeout(Duration::from_millis(1), cache.load("/a")).await;
        assert!(abandoned.is_err());
        assert!(cache.load("/a").await.is_some());
    }

    #[tokio::test]
    async fn closure_follows_includes_and_inherits() {
        let cache = FileCache::new(MemoryLoader::with(&[
            ("/a", "inherit \"/b\";\nvoid f() { }"),
            ("/b", "#include \"c.h\"\nint shared;"),
            ("c.h", "int limit;"),
        ]));
        let report = cache.load_closure(["/a"]).await;
        assert_eq!(report.loaded, vec!["/a", "/b", "c.h"]);
        assert!(report.missing.is_empty());

        let a = cache.context_for("/a").unwrap();
        assert_eq!(a.get_super_identifiers("shared").len(), 1);
        assert_eq!(
            a.get_identifiers(a.root(), "limit", usize::MAX, false, true)
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn cycles_terminate_and_missing_files_are_reported() {
        let cache = FileCache::new(MemoryLoader::with(&[
            ("/a", "inherit \"/b\";\nint a;"),
            ("/b", "inherit \"/a\";\ninherit \"/gone\";\nint b;"),
        ]));
        let report = cache.load_closure(vec!["/a".to_string()]).await;
        assert_eq!(report.loaded, vec!["/a", "/b"]);
        assert_eq!(report.missing, vec!["/gone"]);
        let a = cache.context_for("/a").unwrap();
        assert_eq!(a.get_super_identifiers("b").len(), 1);
    }

    #[tokio::test]
    async fn invalidate_fetches_again() {
        let cache = FileCache::new(MemoryLoader::with(&[("/a", "int x;")]));
        assert!(cache.load("/a").await.is_some());
        cache
            .loader()
            .files
            .lock()
            .unwrap()
            .insert("/a".to_string(), "int x; int y;".to_string());
        assert_eq!(
            cache.load("/a").await.unwrap().top_level_definitions().count(),
            1
        );
        cache.invalidate("/a").await;
        assert_eq!(
            cache.load("/a").await.unwrap().top_level_definitions().count(),
            2
        );
        assert_eq!(cache.loader().calls(), 2);
    }

    #[tokio::test]
    async fn invalidate_during_a_load_drops_its_tree() {
        let cache = FileCache::new(MemoryLoader::with(&[("/a", "int x;")]));
        let (stale, ()) = tokio::join!(cache.load("/a"), async {
            tokio::time::sleep(Duration::from_millis(2)).await;
            cache
                .loader()
                .files
                .lock()
                .unwrap()
                .insert("/a".to_string(), "int x; int y;".to_string());
            cache.invalidate("/a").await;
        });
        assert_eq!(stale.unwrap().top_level_definitions().count(), 1);
        assert!(cache.context_for("/a").is_none());

        let fresh = cache.load("/a").await.unwrap();
        assert_eq!(fresh.top_level_definitions().count(), 2);
        assert!(Arc::ptr_eq(&fresh, &cache.context_for("/a").unwrap()));
        assert_eq!(cache.loader().calls(), 2);
    }

    #[tokio::test]
    async fn waiters_see_the_tree_published_by_the_loader() {
        let cache = FileCache::new(MemoryLoader::with(&[("/a", "int x;")]));
        let (first, second) = tokio::join!(cache.load("/a"), cache.load("/a"));
        let published = cache.context_for("/a").unwrap();
        assert!(Arc::ptr_eq(&first.unwrap(), &published));
        assert!(Arc::ptr_eq(&second.unwrap(), &published));
    }
}
