//! Link check command implementation.
//!
//! ```bash
//! repokit check-links --host http://localhost:3000 --start-command "pnpm docs:serve"
//! repokit check-links --config link-check.toml --format json > report.json
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use colored::Colorize;
use repokit_core::crawl::{CrawlOptions, Crawler, IssueKind, render_text};

use crate::error::CliError;
use crate::output::{OutputFormat, emit, spinner, to_json};

/// Arguments for `repokit check-links`
#[derive(Args, Clone, Debug)]
pub struct CheckLinksArgs {
    /// Crawl options file (.toml or .json); flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the site
    #[arg(long, value_name = "URL")]
    pub host: Option<String>,

    /// Shell command serving the site, started before crawling
    #[arg(long, value_name = "CMD")]
    pub start_command: Option<String>,

    /// Maximum pages fetched at once
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Path to start crawling from (repeatable; replaces configured seeds)
    #[arg(long, value_name = "PATH")]
    pub seed: Vec<String>,

    /// Regex of page paths that are not crawled (repeatable)
    #[arg(long, value_name = "REGEX")]
    pub ignore_path: Vec<String>,

    /// CSS selector of links that are not checked (repeatable)
    #[arg(long, value_name = "SELECTOR")]
    pub ignore_content: Vec<String>,

    /// Target manifest to download and merge into known targets (repeatable)
    #[arg(long = "known-targets-url", value_name = "URL")]
    pub known_targets_urls: Vec<String>,

    /// Where to write the target manifest of the crawled site
    #[arg(long, value_name = "FILE")]
    pub out_path: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl CheckLinksArgs {
    fn options(&self) -> Result<CrawlOptions> {
        let mut options = match &self.config {
            Some(path) => CrawlOptions::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => CrawlOptions::default(),
        };

        if let Some(host) = &self.host {
            options.host.clone_from(host);
        }
        if let Some(command) = &self.start_command {
            options.start_command = Some(command.clone());
        }
        if let Some(concurrency) = self.concurrency {
            if concurrency == 0 {
                return Err(CliError::usage(anyhow!("--concurrency must be at least 1")).into());
            }
            options.concurrency = concurrency;
        }
        if !self.seed.is_empty() {
            options.seed_urls.clone_from(&self.seed);
        }
        options.ignored_paths.extend(self.ignore_path.iter().cloned());
        options
            .ignored_content
            .extend(self.ignore_content.iter().cloned());
        options
            .known_targets_download_url
            .extend(self.known_targets_urls.iter().cloned());
        if let Some(out) = &self.out_path {
            options.out_path = Some(out.clone());
        }
        Ok(options)
    }
}

/// Crawl the site and report broken links.
///
/// Fails with exit code 8 when any issue is found, after printing the report.
pub async fn execute(args: CheckLinksArgs, quiet: bool) -> Result<()> {
    let options = args.options()?;
    let started = Instant::now();

    let pb = spinner(&format!("Crawling {}", options.host), quiet);
    let progress = pb.clone();
    let crawler = Crawler::new(options)?
        .with_progress(move |crawled| progress.set_message(format!("Crawled {crawled} pages")));
    let result = crawler.run().await;
    pb.finish_and_clear();
    let result = result?;
    let elapsed = started.elapsed();

    let content = match args.format {
        OutputFormat::Text => render_text(&result, elapsed),
        OutputFormat::Json => to_json(&result)?,
    };
    emit(&content, None).await?;

    if result.issues.is_empty() {
        if args.format == OutputFormat::Text && !quiet {
            eprintln!("{} No broken links found", "✓".green());
        }
        return Ok(());
    }

    Err(CliError::broken_links(anyhow!(
        "found {} broken links and {} broken targets",
        result.count(IssueKind::BrokenLink),
        result.count(IssueKind::BrokenTarget)
    ))
    .into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::exit_code_from_error;

    fn args() -> CheckLinksArgs {
        CheckLinksArgs {
            config: None,
            host: None,
            start_command: None,
            concurrency: None,
            seed: Vec::new(),
            ignore_path: Vec::new(),
            ignore_content: Vec::new(),
            known_targets_urls: Vec::new(),
            out_path: None,
            format: OutputFormat::Text,
        }
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawl.toml");
        std::fs::write(
            &path,
            "host = \"http://localhost:5000\"\nseedUrls = [\"/docs\"]\nignoredPaths = [\"^/api/\"]\n",
        )
        .unwrap();

        let options = CheckLinksArgs {
            config: Some(path),
            concurrency: Some(2),
            ignore_path: vec!["\\.pdf$".into()],
            ..args()
        }
        .options()
        .unwrap();
        assert_eq!(options.host, "http://localhost:5000");
        assert_eq!(options.seed_urls, vec!["/docs"]);
        assert_eq!(options.concurrency, 2);
        assert_eq!(options.ignored_paths, vec!["^/api/", "\\.pdf$"]);
    }

    #[test]
    fn test_zero_concurrency_is_a_usage_error() {
        let err = CheckLinksArgs {
            concurrency: Some(0),
            ..args()
        }
        .options()
        .unwrap_err();
        assert_eq!(exit_code_from_error(&err), 2);
    }
}
