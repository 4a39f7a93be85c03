//! Crawl records.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Path → set of `#id` targets known to exist on that page.
pub type KnownTargets = BTreeMap<String, BTreeSet<String>>;

/// A link as discovered in markup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Link {
    /// Page the link was found on; `None` for seed links.
    pub src: Option<String>,
    /// Accessible name of the anchor.
    pub text: Option<String>,
    /// `href` attribute as written.
    pub href: String,
}

impl Link {
    /// A seed link with no source page.
    #[must_use]
    pub fn seed(href: impl Into<String>) -> Self {
        Self {
            src: None,
            text: None,
            href: href.into(),
        }
    }
}

/// What a crawled page returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    /// Normalized page path.
    pub url: String,
    /// HTTP status; `0` when no response was received.
    pub status: u16,
    /// Element ids on the page, as `#id`.
    pub targets: BTreeSet<String>,
    /// Media type without parameters, if the server sent a valid one.
    pub content_type: Option<String>,
}

impl PageData {
    /// Whether the page answered with a non-error status.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status < 400
    }
}

/// Kind of crawl issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// The linked page was never reached.
    BrokenLink,
    /// The page was reached but has no element with the linked fragment.
    BrokenTarget,
}

impl IssueKind {
    /// Kebab-case name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BrokenLink => "broken-link",
            Self::BrokenTarget => "broken-target",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A broken link or target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue kind.
    #[serde(rename = "type")]
    pub kind: IssueKind,
    /// The offending link.
    pub link: Link,
    /// Human-readable reason.
    pub message: String,
}

/// Outcome of a crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    /// Every link occurrence seen, seeds included, sorted. A link that
    /// appears twice on a page is listed twice.
    pub links: Vec<Link>,
    /// Crawled pages by normalized path.
    pub pages: BTreeMap<String, PageData>,
    /// Problems found while checking links.
    pub issues: Vec<Issue>,
}

impl CrawlResult {
    /// Number of issues of `kind`.
    #[must_use]
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|issue| issue.kind == kind).count()
    }
}
