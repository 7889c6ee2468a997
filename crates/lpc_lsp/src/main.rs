//! LPC language server: highlights, diagnostics and completion over stdio.

mod backend;
mod completion;
mod diagnostics;
mod document_symbols;
mod hover;
mod semantic_tokens;
mod server;
mod settings;
mod state;
mod workspace;


use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "lpc-lsp", about = "LPC Language Server")]
struct Cli {
    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let default_directive = directive_for_verbosity(cli.verbose);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        // Editors read stderr as plain text.
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    server::run().await;
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "lpc_lsp=info,lpc=info,tower_lsp=warn",
        1 => "lpc_lsp=debug,lpc=debug,tower_lsp=info",
        _ => "lpc_lsp=trace,lpc=trace,tower_lsp=debug",
    }
}
