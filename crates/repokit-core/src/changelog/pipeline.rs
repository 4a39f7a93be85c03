//! End-to-end changelog generation.

use serde::Serialize;
use tracing::info;

use super::categorize::categorize_commits;
use super::config::ChangelogConfig;
use super::contributors::extract_contributors;
use super::filter::filter_commits;
use super::labels::parse_labels;
use super::render::{RenderOptions, render_changelog};
use super::sections::{VersionMap, build_sections, sort_sections};
use super::types::{CategorizedCommit, ChangelogSection, Commit, Contributors};
use crate::Result;

/// Everything a run produces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogOutput {
    /// Rendered markdown.
    pub markdown: String,
    /// Sorted section tree.
    pub sections: Vec<ChangelogSection>,
    /// Release contributors.
    pub contributors: Contributors,
}

/// Run filter, label parsing, categorization, section building, sorting and
/// rendering over `commits`.
///
/// # Errors
///
/// Fails on configuration problems only, most notably a scope or plan
/// without a package mapping.
pub fn generate(
    commits: &[Commit],
    config: &ChangelogConfig,
    options: &RenderOptions,
    versions: &VersionMap,
) -> Result<ChangelogOutput> {
    let filtered = filter_commits(commits, Some(&config.filter));
    let contributors = extract_contributors(&filtered, &config.contributors.team_members);

    let categorized: Vec<CategorizedCommit> = filtered
        .into_iter()
        .map(|mut commit| {
            let parsed = parse_labels(&mut commit, &config.categorization.labels);
            CategorizedCommit { commit, parsed }
        })
        .collect();
    let commit_count = categorized.len();

    let categories = categorize_commits(categorized, &config.categorization)?;
    let sections = build_sections(&categories, &config.categorization, versions);
    let sections = sort_sections(sections, &config.categorization.sections.order);

    info!(
        commits = commit_count,
        input = commits.len(),
        sections = sections.len(),
        "built changelog"
    );

    let markdown = render_changelog(&sections, config, options, &contributors);
    Ok(ChangelogOutput {
        markdown,
        sections,
        contributors,
    })
}
