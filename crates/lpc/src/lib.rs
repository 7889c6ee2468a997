use std::fs;
use std::path::Path;

pub mod ast;
pub mod completion;
pub mod context;
pub mod diagnostics;
mod error;
pub mod highlight;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod syntax;
pub mod types;

pub use ast::{collect_holes, node_path_at, Expected, Node, NodeKind, Visitor};
pub use completion::{suggestions, suggestions_with, Suggestion, SuggestionKind};
pub use context::{
    resolve, ContextId, ContextProvider, ContextTree, Definition, DefinitionKind, NoContexts,
    Resolution,
};
pub use diagnostics::{diagnostics, render_diagnostics, Diagnostic, LineIndex, Position, Span};
pub use error::LpcError;
pub use highlight::{highlights, Highlight, HighlightKind};
pub use lexer::{decode_source, lex, LexOptions, Lexer, Token, TokenKind, TokenValue};
pub use loader::{ClosureReport, FileCache, RemoteCompiler, SourceLoader};
pub use parser::{parse_source, ParseOptions, Parsed, Parser};
pub use types::Type;

/// Reads a source file, decoding it leniently.
pub fn read_source(path: &Path) -> Result<String, LpcError> {
    if !path.is_file() {
        return Err(LpcError::InvalidPath(path.display().to_string()));
    }
    let bytes = fs::read(path)?;
    Ok(decode_source(&bytes))
}
