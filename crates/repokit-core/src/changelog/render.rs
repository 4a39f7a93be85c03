//! Markdown rendering.
//!
//! The output of one release looks like this:
//!
//! ```text
//! ## v8.1.0
//!
//! <!-- generated comparing v8.0.0..master -->
//!
//! _Oct 14, 2026_
//!
//! We'd like to extend a big thank you to the 3 contributors ...
//!
//! TODO INSERT HIGHLIGHTS
//!
//! ### Data Grid
//!
//! #### `@mui/x-data-grid@8.1.0`
//!
//! - [DataGrid] Fix row reordering (#123) @alice
//!
//! #### `@mui/x-data-grid-pro@8.1.0`
//!
//! Same changes as in `@mui/x-data-grid@8.1.0`.
//! ```
//!
//! Within a section, commits are grouped by their leading `[tag]` sequence
//! (case-folded, untagged commits last) and ordered by merge time inside a
//! group.

use std::cmp::Ordering;
use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::config::{ChangelogConfig, ContributorsPlacement};
use super::types::{
    CategorizedCommit, ChangelogSection, Contributors, PackageInfo, PackageSection, PlanSubsection,
    SharedCommit,
};
use crate::util::{fill_template, locale_cmp};

/// Separator for joined tag keys; sorts below every printable character.
const TAG_SEPARATOR: char = '\u{1}';

/// Trailing `(#N)` pull request reference.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static PR_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(#\d+\)\s*$").unwrap());

/// Per-run values that are not part of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Release version, e.g. `v8.1.0`.
    pub version: String,
    /// Release date.
    pub date: NaiveDate,
    /// Start of the compared range.
    pub from_ref: Option<String>,
    /// End of the compared range.
    pub to_ref: Option<String>,
}

/// Values available to a commit line template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitLine {
    /// First line without leading tags and trailing `(#N)`.
    pub message: String,
    /// Leading tags as written, each followed by a space.
    pub tags: String,
    /// Configured flag prefixes, space separated with a trailing space.
    pub flag_prefix: String,
    /// Scopes joined by `, `.
    pub scope: String,
    /// Plan tier or empty.
    pub plan: String,
    /// `@login` or empty.
    pub author: String,
    /// Pull request number.
    pub pr_number: u64,
    /// Pull request URL.
    pub url: String,
    /// Commit hash.
    pub sha: String,
}

impl CommitLine {
    /// Collect template values for `commit`.
    #[must_use]
    pub fn new(commit: &CategorizedCommit, config: &ChangelogConfig) -> Self {
        let first_line = commit.commit.first_line();
        let (tags, rest) = split_leading_tags(first_line);

        let flags: Vec<&str> = commit
            .parsed
            .flags
            .iter()
            .filter_map(|flag| config.categorization.labels.flags.get(flag))
            .map(String::as_str)
            .collect();
        let flag_prefix = if flags.is_empty() {
            String::new()
        } else {
            format!("{} ", flags.join(" "))
        };

        Self {
            message: strip_pr_suffix(rest).to_string(),
            tags: tags.iter().map(|tag| format!("[{tag}] ")).collect(),
            flag_prefix,
            scope: commit.parsed.scopes.join(", "),
            plan: commit.parsed.plan.clone().unwrap_or_default(),
            author: commit
                .commit
                .author
                .as_ref()
                .map(|a| format!("@{}", a.login))
                .unwrap_or_default(),
            pr_number: commit.commit.pr_number,
            url: commit.commit.url.clone(),
            sha: commit.commit.sha.clone(),
        }
    }

    /// Substitute this line's values into `template`.
    #[must_use]
    pub fn render(&self, template: &str) -> String {
        let pr = self.pr_number.to_string();
        let line = fill_template(
            template,
            &[
                ("message", self.message.as_str()),
                ("prNumber", pr.as_str()),
                ("author", self.author.as_str()),
                ("scope", self.scope.as_str()),
                ("plan", self.plan.as_str()),
                ("flagPrefix", self.flag_prefix.as_str()),
                ("tags", self.tags.as_str()),
                ("url", self.url.as_str()),
                ("sha", self.sha.as_str()),
            ],
        );
        line.trim_end().to_string()
    }
}

/// Split the `[tag]` groups at the very start of `line` from the rest.
///
/// Tags are returned as written; the rest is trimmed.
#[must_use]
pub fn split_leading_tags(line: &str) -> (Vec<&str>, &str) {
    let mut tags = Vec::new();
    let mut rest = line;
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(end) = inner.find(']') else { break };
        let tag = &inner[..end];
        if tag.is_empty() || tag.contains('[') {
            break;
        }
        tags.push(tag);
        rest = &inner[end + 1..];
    }
    (tags, rest.trim())
}

/// Case-folded leading tags of a commit title.
#[must_use]
pub fn extract_tags(line: &str) -> Vec<String> {
    split_leading_tags(line)
        .0
        .into_iter()
        .map(str::to_lowercase)
        .collect()
}

fn strip_pr_suffix(message: &str) -> &str {
    match PR_SUFFIX.find(message) {
        Some(m) => &message[..m.start()],
        None => message,
    }
}

/// Grouping key of a commit: joined case-folded tags, `None` when untagged.
fn tag_key(commit: &CategorizedCommit) -> Option<String> {
    let tags = extract_tags(commit.commit.first_line());
    if tags.is_empty() {
        None
    } else {
        Some(tags.join(&TAG_SEPARATOR.to_string()))
    }
}

/// Order commits for display: by tag group, then merge time, then PR number.
#[must_use]
pub fn sort_commits(commits: &[SharedCommit]) -> Vec<SharedCommit> {
    let mut keyed: Vec<(Option<String>, &SharedCommit)> =
        commits.iter().map(|c| (tag_key(c), c)).collect();
    keyed.sort_by(|(ka, a), (kb, b)| {
        let by_tags = match (ka, kb) {
            (Some(ka), Some(kb)) => locale_cmp(ka, kb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_tags
            .then_with(|| match (a.commit.merged_at, b.commit.merged_at) {
                (Some(ta), Some(tb)) => ta.cmp(&tb),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| a.commit.pr_number.cmp(&b.commit.pr_number))
    });
    keyed.into_iter().map(|(_, c)| SharedCommit::clone(c)).collect()
}

/// Render a complete release entry.
#[must_use]
pub fn render_changelog(
    sections: &[ChangelogSection],
    config: &ChangelogConfig,
    options: &RenderOptions,
    contributors: &Contributors,
) -> String {
    let format = &config.format;
    let mut blocks: Vec<String> = Vec::new();

    blocks.push(fill_template(
        &format.version_header,
        &[("version", options.version.as_str())],
    ));

    if format.diff_comment {
        if let (Some(from), Some(to)) = (&options.from_ref, &options.to_ref) {
            blocks.push(format!("<!-- generated comparing {from}..{to} -->"));
        }
    }

    let mut date = String::new();
    if write!(date, "{}", options.date.format(&format.date_format)).is_err() {
        date = options.date.to_string();
    }
    blocks.push(format!("_{date}_"));

    if config.intro.enabled {
        let all = contributors.all.len().to_string();
        let team = contributors.team.len().to_string();
        let community = contributors.community.len().to_string();
        blocks.push(fill_template(
            &config.intro.thanks_template,
            &[
                ("contributorCount", all.as_str()),
                ("teamCount", team.as_str()),
                ("communityCount", community.as_str()),
            ],
        ));
        blocks.push(config.intro.highlights_placeholder.clone());
    }

    let contributors_block = config
        .contributors
        .enabled
        .then(|| render_contributors(contributors, config))
        .filter(|block| !block.is_empty());

    if config.contributors.placement == ContributorsPlacement::Early {
        blocks.extend(contributors_block.clone());
    }

    for section in sections {
        render_section(section, config, &mut blocks);
    }

    if config.contributors.placement == ContributorsPlacement::Late {
        blocks.extend(contributors_block);
    }

    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

fn render_section(section: &ChangelogSection, config: &ChangelogConfig, blocks: &mut Vec<String>) {
    let titles = &config.categorization.sections;
    match section {
        ChangelogSection::Flat(flat) => {
            blocks.push(heading(flat.level, titles.title(&flat.key)));
            if let Some(list) = render_commits(&flat.commits, config) {
                blocks.push(list);
            }
        },
        ChangelogSection::Package(group) => {
            blocks.push(heading(group.level, titles.title(&group.key)));
            for (index, sub) in group.subsections.iter().enumerate() {
                render_subsection(group, index, sub, config, blocks);
            }
        },
    }
}

fn render_subsection(
    group: &PackageSection,
    index: usize,
    sub: &PlanSubsection,
    config: &ChangelogConfig,
    blocks: &mut Vec<String>,
) {
    let format = &config.format;
    let mut title = format!("`{}`", package_label(&sub.package));
    if let Some(badge) = sub.package.plan.as_ref().and_then(|p| format.plan_badges.get(p)) {
        let _ = write!(title, " {badge}");
    }
    blocks.push(heading(sub.level, &title));

    match &sub.package.plan {
        None => {
            if sub.commits.is_empty() {
                blocks.extend(format.internal_changes_message.clone());
            }
        },
        Some(_) => {
            let previous = previous_tier(group, index);
            if sub.commits.is_empty() {
                blocks.push(plan_message(&format.plan_unchanged_message, &previous, 0));
            } else {
                blocks.push(plan_message(
                    &format.plan_plus_message,
                    &previous,
                    sub.commits.len(),
                ));
            }
        },
    }

    if let Some(list) = render_commits(&sub.commits, config) {
        blocks.push(list);
    }
}

fn plan_message(template: &str, previous: &str, count: usize) -> String {
    let count = count.to_string();
    fill_template(template, &[("previous", previous), ("count", count.as_str())])
}

/// Nearest earlier tier of the subsection at `index`, or the base package.
///
/// Plan tiers form a single chain: base, then plans in declaration order.
fn previous_tier(group: &PackageSection, index: usize) -> String {
    group.subsections[..index]
        .iter()
        .rev()
        .find(|s| s.package.plan.is_some())
        .or_else(|| group.subsections.first())
        .map_or_else(|| group.key.clone(), |s| package_label(&s.package))
}

fn package_label(package: &PackageInfo) -> String {
    match &package.version {
        Some(version) => format!("{}@{version}", package.name),
        None => package.name.clone(),
    }
}

fn heading(level: u8, text: &str) -> String {
    format!("{} {text}", "#".repeat(usize::from(level)))
}

fn render_commits(commits: &[SharedCommit], config: &ChangelogConfig) -> Option<String> {
    if commits.is_empty() {
        return None;
    }
    let lines: Vec<String> = sort_commits(commits)
        .iter()
        .map(|commit| render_commit(commit, config))
        .collect();
    Some(lines.join("\n"))
}

/// Render a single commit line.
#[must_use]
pub fn render_commit(commit: &CategorizedCommit, config: &ChangelogConfig) -> String {
    let line = CommitLine::new(commit, config);
    match &config.format.formatter {
        Some(formatter) => (formatter.get())(commit, &line),
        None => line.render(&config.format.commit_template),
    }
}

fn render_contributors(contributors: &Contributors, config: &ChangelogConfig) -> String {
    let mut parts = Vec::new();
    let list = |logins: &[String]| {
        logins
            .iter()
            .map(|login| format!("@{login}"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    if !contributors.community.is_empty() {
        parts.push(format!(
            "{}\n{}",
            config.contributors.community_heading,
            list(&contributors.community)
        ));
    }
    if !contributors.team.is_empty() {
        parts.push(format!(
            "{}\n{}",
            config.contributors.team_heading,
            list(&contributors.team)
        ));
    }
    parts.join("\n\n")
}
