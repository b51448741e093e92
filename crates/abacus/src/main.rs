#![forbid(unsafe_code)]

//! Binary entry point: logging, argument capture, session run.

use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Logs go to stderr so they do not interleave with the REPL output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut frontend = match abacus::TermFrontend::new() {
        Ok(frontend) => frontend,
        Err(err) => {
            error!("failed to initialize terminal: {err}");
            eprintln!("abacus: failed to initialize terminal: {err}");
            return ExitCode::FAILURE;
        }
    };

    match abacus::run(args, &mut frontend) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("session failed: {err}");
            eprintln!("abacus: {err}");
            ExitCode::FAILURE
        }
    }
}
