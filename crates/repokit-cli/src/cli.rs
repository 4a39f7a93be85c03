//! Command-line interface definitions.

use clap::{Parser, Subcommand};

use crate::commands::changelog::ChangelogArgs;
use crate::commands::check_links::CheckLinksArgs;

/// Release tooling for component library monorepos
///
/// # Examples
///
/// ```bash
/// repokit changelog --config changelog.config.toml --repo mui/mui-x --from v8.0.0
/// repokit check-links --host http://localhost:3000 --start-command "pnpm docs:serve"
/// ```
#[derive(Parser, Clone, Debug)]
#[command(name = "repokit")]
#[command(version)]
#[command(about = "repokit - changelogs and broken link checks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug logs
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable all ANSI colors in output (also respects `NO_COLOR` env)
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Generate release notes from merged pull requests
    Changelog(ChangelogArgs),

    /// Crawl a documentation site and report broken links
    #[command(name = "check-links")]
    CheckLinks(CheckLinksArgs),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_changelog_needs_a_commit_source() {
        let result = Cli::try_parse_from(["repokit", "changelog", "--config", "c.toml"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "repokit",
            "changelog",
            "--config",
            "c.toml",
            "--commits",
            "commits.json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Changelog(_)));
    }

    #[test]
    fn test_repo_requires_from() {
        let result = Cli::try_parse_from([
            "repokit",
            "changelog",
            "--config",
            "c.toml",
            "--repo",
            "mui/mui-x",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_links_repeated_flags() {
        let cli = Cli::try_parse_from([
            "repokit",
            "check-links",
            "--seed",
            "/",
            "--seed",
            "/x",
            "--ignore-path",
            "^/api/",
            "-q",
        ])
        .unwrap();
        assert!(cli.quiet);
        let Commands::CheckLinks(args) = cli.command else {
            panic!("expected check-links");
        };
        assert_eq!(args.seed, vec!["/", "/x"]);
        assert_eq!(args.ignore_path, vec!["^/api/"]);
    }
}
