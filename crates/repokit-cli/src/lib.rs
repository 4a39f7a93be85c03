//! repokit CLI - changelog generation and broken link checks
//!
//! The binary is a thin wrapper around [`run`].

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
pub mod error;
mod logging;
mod output;

use cli::{Cli, Commands};
use logging::initialize_logging;

/// Execute the repokit CLI with the current process arguments.
///
/// # Errors
///
/// Returns an error if logging cannot be initialized or the command fails.
/// A link check that finds issues fails with
/// [`ErrorCategory::BrokenLinks`](error::ErrorCategory::BrokenLinks).
pub async fn run() -> Result<()> {
    // Convert Broken pipe panics into a clean exit
    std::panic::set_hook(Box::new(|info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe") || msg.contains("broken pipe") {
            std::process::exit(0);
        }
        eprintln!("{msg}");
    }));

    let cli = Cli::parse();
    initialize_logging(&cli)?;

    match cli.command {
        Commands::Changelog(args) => commands::changelog::execute(args).await,
        Commands::CheckLinks(args) => commands::check_links::execute(args, cli.quiet).await,
    }
}
