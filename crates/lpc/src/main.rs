use std::env;
use std::path::Path;
use std::process::ExitCode;

use lpc::{
    diagnostics, highlights, lex, parse_source, read_source, render_diagnostics, LexOptions,
    LpcError, ParseOptions,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(LpcError::Diagnostics) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), LpcError> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_help();
        return Ok(());
    };
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "-h" | "--help" => {
            print_help();
            Ok(())
        }
        "parse" => {
            let Some(target) = rest.first() else {
                print_help();
                return Ok(());
            };
            let text = read_source(Path::new(target))?;
            let parsed = parse_source(&text, ParseOptions::interpretation());
            print_json(&parsed.nodes)
        }
        "tokens" => {
            let Some(target) = rest.first() else {
                print_help();
                return Ok(());
            };
            let text = read_source(Path::new(target))?;
            let tokens = lex(
                &text,
                LexOptions {
                    emit_comments: true,
                },
            );
            print_json(&tokens)
        }
        "highlight" => {
            let Some(target) = rest.first() else {
                print_help();
                return Ok(());
            };
            let text = read_source(Path::new(target))?;
            let parsed = parse_source(&text, ParseOptions::editor());
            print_json(&highlights(&parsed))
        }
        "check" => {
            let Some(target) = rest.first() else {
                print_help();
                return Ok(());
            };
            let text = read_source(Path::new(target))?;
            let parsed = parse_source(&text, ParseOptions::interpretation());
            let found = diagnostics(&parsed, &text);
            if found.is_empty() {
                return Ok(());
            }
            eprintln!("{}", render_diagnostics(target, &found));
            Err(LpcError::Diagnostics)
        }
        other => Err(LpcError::InvalidCommand(other.to_string())),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), LpcError> {
    let output = serde_json::to_string_pretty(value)?;
    println!("{output}");
    Ok(())
}

fn print_help() {
    println!(
        "lpc\n\nUSAGE:\n  lpc <COMMAND> <file>\n\nCOMMANDS:\n  parse <file>      print the syntax tree as JSON\n  tokens <file>     print the token stream as JSON\n  highlight <file>  print highlight ranges as JSON\n  check <file>      report syntax holes; exit code 1 when any exist\n\n  -h, --help"
    );
}
