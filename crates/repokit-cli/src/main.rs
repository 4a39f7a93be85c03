//! repokit CLI - changelog generation and broken link checks
//!
//! All command implementations live in the library crate; this binary only
//! maps failures onto exit codes.

use std::process::ExitCode;

use colored::Colorize;
use repokit_cli::error::exit_code_from_error;

#[tokio::main]
async fn main() -> ExitCode {
    match repokit_cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(exit_code_from_error(&err))
        },
    }
}
