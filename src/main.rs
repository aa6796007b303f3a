//! Othello agent process
//!
//! Speaks the line protocol on stdin/stdout. Logs go to stderr; set
//! `RUST_LOG=debug` to see per-move search statistics.

use std::io;
use std::process::ExitCode;

use log::error;
use othello_agent::protocol::run_agent;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let stdin = io::stdin();
    let stdout = io::stdout();

    match run_agent(stdin.lock(), stdout.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
