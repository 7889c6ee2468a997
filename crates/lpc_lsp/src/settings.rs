use std::path::PathBuf;

use serde::Deserialize;

/// Client settings, from `initializationOptions` or
/// `workspace/didChangeConfiguration` (optionally nested under `lpc`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Settings {
    /// Directories searched for `#include "name"` targets.
    pub(crate) include_paths: Vec<PathBuf>,
    pub(crate) show_diagnostics: bool,
    /// Driver command run on save; `{name}` is replaced by the program name.
    pub(crate) compile_command: Vec<String>,
    /// Where saved programs are copied before compiling.
    pub(crate) deploy_root: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            include_paths: Vec::new(),
            show_diagnostics: true,
            compile_command: Vec::new(),
            deploy_root: None,
        }
    }
}

impl Settings {
    pub(crate) fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let value = match value {
            serde_json::Value::Object(mut map) if map.contains_key("lpc") => {
                map.remove("lpc").unwrap_or_default()
            }
            other => other,
        };
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
    }
}
