//! Changelog command implementation.
//!
//! ```bash
//! repokit changelog --config changelog.config.toml --repo mui/mui-x --from v8.0.0 --release v8.1.0
//! repokit changelog --config changelog.config.json --commits commits.json --format json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Args};
use repokit_core::changelog::workspace::{DEFAULT_PACKAGE_DIRS, package_versions};
use repokit_core::changelog::{
    ChangelogConfig, CommitRange, CommitSource, GitHubCommitSource, JsonCommitSource,
    RenderOptions, VersionMap, generate,
};
use tracing::info;

use crate::output::{OutputFormat, emit, to_json};

/// Arguments for `repokit changelog`
#[derive(Args, Clone, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["repo", "commits"])))]
pub struct ChangelogArgs {
    /// Changelog configuration file (.toml or .json)
    #[arg(long, value_name = "FILE")]
    pub config: PathBuf,

    /// GitHub repository to read merged pull requests from
    #[arg(long, value_name = "OWNER/NAME", requires = "from")]
    pub repo: Option<String>,

    /// Read commit records from a JSON file instead of GitHub
    #[arg(long, value_name = "FILE")]
    pub commits: Option<PathBuf>,

    /// Older ref of the compared range (exclusive)
    #[arg(long, value_name = "REF")]
    pub from: Option<String>,

    /// Newer ref of the compared range
    #[arg(long, value_name = "REF", default_value = "HEAD")]
    pub to: String,

    /// Version shown in the release header
    #[arg(long, value_name = "VERSION", default_value = "Unreleased")]
    pub release: String,

    /// Release date (defaults to today)
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Monorepo root used to look up package versions
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Package directories below the workspace root
    #[arg(long = "package-dir", value_name = "DIR")]
    pub package_dirs: Vec<String>,

    /// GitHub token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub API base URL
    #[arg(long, value_name = "URL", env = "REPOKIT_GITHUB_API")]
    pub api_url: Option<String>,

    /// Write the result to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("invalid value '{value}': {e}"))
}

/// Generate a changelog entry.
pub async fn execute(args: ChangelogArgs) -> Result<()> {
    let config = ChangelogConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    let range = CommitRange {
        from: args.from.clone().unwrap_or_default(),
        to: args.to.clone(),
    };
    let source = commit_source(&args)?;
    let commits = source.fetch_commits(&range).await?;
    info!(commits = commits.len(), "fetched commits");

    let versions = match &args.workspace {
        Some(root) => {
            let dirs = if args.package_dirs.is_empty() {
                DEFAULT_PACKAGE_DIRS.iter().map(ToString::to_string).collect()
            } else {
                args.package_dirs.clone()
            };
            package_versions(root, &dirs).await
        },
        None => VersionMap::new(),
    };

    let options = RenderOptions {
        version: args.release.clone(),
        date: args.date.unwrap_or_else(|| Local::now().date_naive()),
        from_ref: args.from.clone(),
        to_ref: Some(args.to.clone()),
    };
    let output = generate(&commits, &config, &options, &versions)?;

    let content = match args.format {
        OutputFormat::Text => output.markdown,
        OutputFormat::Json => to_json(&output)?,
    };
    emit(&content, args.out.as_deref()).await
}

fn commit_source(args: &ChangelogArgs) -> Result<Box<dyn CommitSource>> {
    if let Some(path) = &args.commits {
        return Ok(Box::new(JsonCommitSource::new(path)));
    }
    let slug = args.repo.as_deref().unwrap_or_default();
    let mut source = GitHubCommitSource::from_slug(slug)?.with_token(args.token.clone());
    if let Some(api) = &args.api_url {
        source = source.with_api_base(api);
    }
    Ok(Box::new(source))
}
