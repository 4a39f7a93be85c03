//! Core data types for the changelog pipeline.
//!
//! Commit records come in from a [`CommitSource`](super::github::CommitSource),
//! get their labels parsed once, and are then shared by reference between
//! every category and section they belong to.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an author relates to the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthorAssociation {
    /// Maintainer or organization member.
    Team,
    /// First contribution to the repository.
    FirstTimer,
    /// Any other outside contributor.
    Contributor,
}

impl AuthorAssociation {
    /// Map a GitHub `author_association` value onto the three known buckets.
    #[must_use]
    pub fn from_github(value: &str) -> Self {
        match value {
            "OWNER" | "MEMBER" | "COLLABORATOR" => Self::Team,
            "FIRST_TIMER" | "FIRST_TIME_CONTRIBUTOR" => Self::FirstTimer,
            _ => Self::Contributor,
        }
    }
}

/// Commit author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Login handle, without the leading `@`.
    pub login: String,
    /// Relationship to the repository.
    pub association: AuthorAssociation,
}

/// A merged change as handed over by a commit source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Commit hash.
    pub sha: String,
    /// Full commit message; the first line is the title.
    pub message: String,
    /// Raw labels in the order the source reported them.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Pull request number.
    pub pr_number: u64,
    /// Link to the pull request.
    #[serde(default)]
    pub url: String,
    /// Author, when known.
    #[serde(default)]
    pub author: Option<Author>,
    /// When the pull request was merged.
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    /// When the pull request was opened.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Commit {
    /// First line of the message.
    #[must_use]
    pub fn first_line(&self) -> &str {
        self.message.lines().next().unwrap_or_default().trim()
    }

    /// Merge extra labels into this commit, skipping ones already present.
    pub fn merge_labels<I>(&mut self, extra: I)
    where
        I: IntoIterator<Item = String>,
    {
        for label in extra {
            if !self.labels.contains(&label) {
                self.labels.push(label);
            }
        }
    }
}

/// Structured tags derived from a commit's labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedLabels {
    /// Scope values, in label order.
    pub scopes: Vec<String>,
    /// Component values, in label order.
    pub components: Vec<String>,
    /// Plan tier, lower-cased and validated against the allow-list.
    pub plan: Option<String>,
    /// Flag keys present on the commit, in label order.
    pub flags: Vec<String>,
    /// Category override; the last matching override label wins.
    pub category_override: Option<String>,
}

/// A commit paired with its parsed labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedCommit {
    /// The commit record.
    pub commit: Commit,
    /// Parsed labels.
    pub parsed: ParsedLabels,
}

/// Shared handle used by every category a commit is filed under.
pub type SharedCommit = Arc<CategorizedCommit>;

/// Category key → commits, each list in input commit order.
pub type CategoryMap = BTreeMap<String, Vec<SharedCommit>>;

/// Package metadata attached to a plan subsection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    /// Package name, e.g. `@mui/x-data-grid-pro`.
    pub name: String,
    /// Version from the workspace, if known.
    pub version: Option<String>,
    /// Plan tier; `None` for the base package.
    pub plan: Option<String>,
}

/// A single list of commits under one heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatSection {
    /// Category key.
    pub key: String,
    /// Markdown heading depth.
    pub level: u8,
    /// Commits in this section.
    pub commits: Vec<SharedCommit>,
}

/// One plan tier of a package group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSubsection {
    /// Category key (the package name).
    pub key: String,
    /// Markdown heading depth.
    pub level: u8,
    /// Commits filed under this package.
    pub commits: Vec<SharedCommit>,
    /// Package metadata.
    pub package: PackageInfo,
}

/// A base package with one subsection per plan tier.
///
/// The group itself holds no commits; they live in the subsections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSection {
    /// Base package key.
    pub key: String,
    /// Markdown heading depth.
    pub level: u8,
    /// Subsections in plan order.
    pub subsections: Vec<PlanSubsection>,
}

/// A top-level changelog section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChangelogSection {
    /// Plain list of commits.
    Flat(FlatSection),
    /// Package with plan-tier subsections.
    Package(PackageSection),
}

impl ChangelogSection {
    /// Category key of the section.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Flat(section) => &section.key,
            Self::Package(section) => &section.key,
        }
    }

    /// Markdown heading depth of the section.
    #[must_use]
    pub const fn level(&self) -> u8 {
        match self {
            Self::Flat(section) => section.level,
            Self::Package(section) => section.level,
        }
    }

    /// Total number of commits, subsections included.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        match self {
            Self::Flat(section) => section.commits.len(),
            Self::Package(section) => section.subsections.iter().map(|s| s.commits.len()).sum(),
        }
    }
}

/// Release contributors split by association.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributors {
    /// Team members, sorted case-insensitively.
    pub team: Vec<String>,
    /// Community members, sorted case-insensitively.
    pub community: Vec<String>,
    /// Union of both lists, sorted case-insensitively.
    pub all: Vec<String>,
}
