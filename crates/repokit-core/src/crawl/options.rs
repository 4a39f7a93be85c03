//! Crawl options and compiled ignore rules.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use scraper::Selector;
use serde::Deserialize;

use super::types::KnownTargets;
use crate::{Error, Result, config};

/// Settings for one crawl.
///
/// ```toml
/// host = "http://localhost:3000"
/// startCommand = "pnpm docs:serve"
/// ignoredPaths = ["^/api/", "\\.pdf$"]
/// ignoredContent = [".edit-on-github"]
/// knownTargetsDownloadUrl = ["https://mui.com/x/link-structure.json"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrawlOptions {
    /// Shell command that serves the site; spawned before crawling.
    pub start_command: Option<String>,
    /// Base URL of the site.
    pub host: String,
    /// Where to write the target manifest.
    pub out_path: Option<PathBuf>,
    /// Regexes of page paths that are not crawled.
    pub ignored_paths: Vec<String>,
    /// CSS selectors of links that are not extracted.
    pub ignored_content: Vec<String>,
    /// Element ids that never count as targets.
    pub ignored_targets: Vec<String>,
    /// Pages whose targets are known up front; never fetched.
    pub known_targets: KnownTargets,
    /// Target manifests merged into `known_targets`.
    pub known_targets_download_url: Vec<String>,
    /// Maximum pages fetched at once.
    pub concurrency: usize,
    /// Paths the crawl starts from.
    pub seed_urls: Vec<String>,
    /// How long to wait for a started server.
    pub server_timeout_secs: u64,
    /// Pages slower than this are logged.
    pub slow_page_ms: u64,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            start_command: None,
            host: "http://localhost:3000".to_string(),
            out_path: None,
            ignored_paths: Vec::new(),
            ignored_content: Vec::new(),
            ignored_targets: vec!["__next".to_string(), "__NEXT_DATA__".to_string()],
            known_targets: KnownTargets::new(),
            known_targets_download_url: Vec::new(),
            concurrency: 4,
            seed_urls: vec!["/".to_string()],
            server_timeout_secs: 60,
            slow_page_ms: 5000,
        }
    }
}

impl CrawlOptions {
    /// Load options from a `.toml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let options: Self = config::load_file(path)?;
        options.rules()?;
        Ok(options)
    }

    /// Compile the ignore lists.
    pub fn rules(&self) -> Result<IgnoreRules> {
        IgnoreRules::compile(self)
    }

    /// Server polling timeout.
    #[must_use]
    pub const fn server_timeout(&self) -> Duration {
        Duration::from_secs(self.server_timeout_secs)
    }

    /// Slow page threshold.
    #[must_use]
    pub const fn slow_page(&self) -> Duration {
        Duration::from_millis(self.slow_page_ms)
    }
}

/// Ignore lists ready for matching.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    /// Page paths not crawled.
    pub paths: Vec<Regex>,
    /// Links not extracted.
    pub content: Vec<Selector>,
    /// Ids not collected as targets.
    pub targets: HashSet<String>,
}

impl IgnoreRules {
    /// Compile rules from `options`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPattern`] for a regex or selector that does not parse.
    pub fn compile(options: &CrawlOptions) -> Result<Self> {
        let paths = options
            .ignored_paths
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| Error::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let content = options
            .ignored_content
            .iter()
            .map(|selector| {
                Selector::parse(selector).map_err(|e| Error::InvalidPattern {
                    pattern: selector.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            paths,
            content,
            targets: options.ignored_targets.iter().cloned().collect(),
        })
    }

    /// Whether `path` matches an ignored path pattern.
    #[must_use]
    pub fn ignores_path(&self, path: &str) -> bool {
        self.paths.iter().any(|re| re.is_match(path))
    }
}
