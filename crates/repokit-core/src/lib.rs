//! # repokit-core
//!
//! Release tooling for component library monorepos.
//!
//! The crate provides two independent pipelines:
//!
//! - **Changelog generation** ([`changelog`]): turns merged pull requests into
//!   a markdown release section. Commits are filtered, their labels parsed,
//!   categorized by component or by package, grouped into sections and
//!   rendered with configurable templates.
//! - **Broken link detection** ([`crawl`]): crawls a built documentation site
//!   with bounded concurrency and reports links to missing pages or missing
//!   `#id` targets.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use repokit_core::changelog::{ChangelogConfig, RenderOptions, VersionMap, generate};
//! use std::path::Path;
//!
//! let config = ChangelogConfig::load(Path::new("changelog.config.toml"))?;
//! let options = RenderOptions {
//!     version: "v8.4.0".to_string(),
//!     date: chrono::NaiveDate::from_ymd_opt(2026, 10, 14)
//!         .ok_or_else(|| repokit_core::Error::Other("invalid date".into()))?,
//!     from_ref: Some("v8.3.0".to_string()),
//!     to_ref: Some("master".to_string()),
//! };
//! let output = generate(&[], &config, &options, &VersionMap::new())?;
//! print!("{}", output.markdown);
//! # Ok::<(), repokit_core::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`]. Configuration mistakes abort
//! immediately; per-page crawl failures are reported as issues instead:
//!
//! ```rust,no_run
//! use repokit_core::crawl::{CrawlOptions, IssueKind, crawl};
//!
//! # async fn run() -> repokit_core::Result<()> {
//! let result = crawl(CrawlOptions::default()).await?;
//! println!("{} broken links", result.count(IssueKind::BrokenLink));
//! # Ok(())
//! # }
//! ```

/// Changelog generation pipeline
pub mod changelog;
/// Configuration file loading
pub mod config;
/// Site crawler and link checker
pub mod crawl;
/// Error types and result aliases
pub mod error;
/// String helpers
pub mod util;

pub use error::{Error, Result};
