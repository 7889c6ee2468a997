use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use lpc::{decode_source, RemoteCompiler, SourceLoader};

use crate::settings::Settings;

#[derive(Debug, Clone, Default)]
struct Layout {
    root: Option<PathBuf>,
    include_paths: Vec<PathBuf>,
}

/// Reads `inherit`/`#include` targets from the mudlib on disk.
///
/// Absolute names (`/std/room`) live under the workspace root, with or
/// without a `.c` suffix. Other names are searched in the include paths and
/// then in the root.
#[derive(Debug, Default)]
pub(crate) struct DiskLoader {
    layout: RwLock<Layout>,
}

impl DiskLoader {
    pub(crate) fn configure(&self, root: Option<PathBuf>, settings: &Settings) {
        let include_paths = settings
            .include_paths
            .iter()
            .map(|path| match &root {
                Some(root) if path.is_relative() => root.join(path),
                _ => path.clone(),
            })
            .collect();
        if let Ok(mut layout) = self.layout.write() {
            *layout = Layout {
                root,
                include_paths,
            };
        }
    }

    pub(crate) fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let Ok(layout) = self.layout.read() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if let Some(relative) = name.strip_prefix('/') {
            if let Some(root) = &layout.root {
                out.push(root.join(relative));
                if Path::new(relative).extension().is_none() {
                    out.push(root.join(format!("{relative}.c")));
                }
            }
            return out;
        }
        for dir in layout.include_paths.iter().chain(layout.root.iter()) {
            out.push(dir.join(name));
        }
        out
    }
}

impl SourceLoader for DiskLoader {
    fn load_source(&self, name: &str) -> impl Future<Output = Option<String>> + Send {
        let candidates = self.candidates(name);
        let name = name.to_string();
        async move {
            for path in candidates {
                if let Ok(bytes) = tokio::fs::read(&path).await {
                    tracing::debug!(name = %name, path = %path.display(), "loaded source");
                    return Some(decode_source(&bytes));
                }
            }
            tracing::debug!(name = %name, "no source on disk");
            None
        }
    }
}

/// The name other programs use for the file at `path`: the path below the
/// mudlib root with a leading `/` and no `.c` suffix.
pub(crate) fn program_name(root: Option<&Path>, path: &Path) -> String {
    let Some(relative) = root.and_then(|root| path.strip_prefix(root).ok()) else {
        return path.display().to_string();
    };
    let mut name = String::new();
    for component in relative.components() {
        name.push('/');
        name.push_str(&component.as_os_str().to_string_lossy());
    }
    match name.strip_suffix(".c") {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

#[derive(Debug, Clone, Default)]
struct DriverConfig {
    command: Vec<String>,
    deploy_root: Option<PathBuf>,
}

/// Stands in for the game driver: `save` copies a program into the deploy
/// directory and `compile` runs the configured driver command.
#[derive(Debug, Default)]
pub(crate) struct LocalCompiler {
    config: RwLock<DriverConfig>,
}

impl LocalCompiler {
    pub(crate) fn configure(&self, settings: &Settings) {
        if let Ok(mut config) = self.config.write() {
            *config = DriverConfig {
                command: settings.compile_command.clone(),
                deploy_root: settings.deploy_root.clone(),
            };
        }
    }

    fn config(&self) -> DriverConfig {
        self.config
            .read()
            .map(|config| config.clone())
            .unwrap_or_default()
    }
}

pub(crate) fn expand_command(command: &[String], name: &str) -> Vec<String> {
    command
        .iter()
        .map(|arg| arg.replace("{name}", name))
        .collect()
}

pub(crate) fn deploy_path(deploy_root: &Path, name: &str) -> PathBuf {
    let relative = name.trim_start_matches('/');
    if Path::new(relative).extension().is_some() {
        deploy_root.join(relative)
    } else {
        deploy_root.join(format!("{relative}.c"))
    }
}

impl RemoteCompiler for LocalCompiler {
    fn can_compile(&self) -> bool {
        !self.config().command.is_empty()
    }

    fn compile(&self, name: &str) {
        let command = expand_command(&self.config().command, name);
        let Some((program, args)) = command.split_first() else {
            return;
        };
        let program = program.clone();
        let args = args.to_vec();
        let name = name.to_string();
        tokio::spawn(async move {
            match tokio::process::Command::new(&program)
                .args(&args)
                .output()
                .await
            {
                Ok(output) => {
                    tracing::info!(name = %name, status = %output.status, "compile finished");
                    for line in String::from_utf8_lossy(&output.stderr).lines() {
                        tracing::debug!(name = %name, "{line}");
                    }
                }
                Err(err) => tracing::warn!(name = %name, error = %err, "compile failed to start"),
            }
        });
    }

    fn save(&self, name: &str, content: &str) {
        let Some(deploy_root) = self.config().deploy_root else {
            return;
        };
        let path = deploy_path(&deploy_root, name);
        let content = content.to_string();
        tokio::spawn(async move {
            if let Some(parent) = path.parent() {
                if let Err(err) = tokio::fs::create_dir_all(parent).await {
                    tracing::warn!(path = %parent.display(), error = %err, "cannot create deploy directory");
                    return;
                }
            }
            match tokio::fs::write(&path, content).await {
                Ok(()) => tracing::debug!(path = %path.display(), "deployed"),
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "deploy failed"),
            }
        });
    }
}
