use thiserror::Error;

#[derive(Debug, Error)]
pub enum LpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Holes were found and already reported.
    #[error("diagnostics reported")]
    Diagnostics,
}
