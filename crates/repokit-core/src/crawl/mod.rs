//! Broken link detection for documentation sites.
//!
//! [`Crawler`] walks a site from its seed paths, collecting every link and
//! every `#id` target, then reports links to pages that could not be reached
//! ([`IssueKind::BrokenLink`]) and links whose fragment names no element on
//! the target page ([`IssueKind::BrokenTarget`]).

pub mod fetcher;
pub mod known_targets;
pub mod normalize;
pub mod options;
pub mod orchestrator;
pub mod parse;
pub mod queue;
pub mod report;
pub mod server;
pub mod types;

pub use fetcher::{FetchedPage, HttpPageFetcher, PageFetcher};
pub use known_targets::TargetManifest;
pub use options::CrawlOptions;
pub use orchestrator::{Crawler, crawl};
pub use queue::TaskQueue;
pub use report::render_text;
pub use types::{CrawlResult, Issue, IssueKind, KnownTargets, Link, PageData};
