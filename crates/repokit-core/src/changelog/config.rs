//! Changelog configuration.
//!
//! A [`ChangelogConfig`] is usually loaded from `changelog.config.toml` (or
//! `.json`) and validated before any commit is looked at:
//!
//! ```toml
//! [categorization]
//! strategy = "package"
//!
//! [categorization.labels]
//! scope = ["scope:"]
//! plan = { values = ["pro", "premium"] }
//! flags = { "breaking change" = "**Breaking change**" }
//!
//! [categorization.packageNaming]
//! mappings = { "data grid" = "@mui/x-data-grid" }
//! genericScopes = ["docs", "code-infra"]
//!
//! [[categorization.packageNaming.plans]]
//! name = "pro"
//! packages = { "@mui/x-data-grid" = "@mui/x-data-grid-pro" }
//!
//! [categorization.sections]
//! fallbackSection = "Other"
//! order = { "docs" = 10, "code-infra" = 20 }
//! ```
//!
//! Callbacks (title label extraction, custom filters, custom commit
//! formatting) cannot be expressed in a file; set them on the loaded value
//! through [`Hook`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;

use super::render::CommitLine;
use super::types::{CategorizedCommit, Commit};
use crate::{Error, Result, config};

/// A programmatically supplied callback.
pub struct Hook<F: ?Sized>(pub Arc<F>);

impl<F: ?Sized> Hook<F> {
    /// Access the wrapped callback.
    #[must_use]
    pub fn get(&self) -> &F {
        &self.0
    }
}

impl<F: ?Sized> Clone for Hook<F> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<F: ?Sized> fmt::Debug for Hook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook(<fn>)")
    }
}

/// Extracts additional labels from a commit title.
pub type TitleLabelExtractor = dyn Fn(&str) -> Vec<String> + Send + Sync;
/// Returns `false` to drop a commit.
pub type CommitPredicate = dyn Fn(&Commit) -> bool + Send + Sync;
/// Renders one commit line, replacing the template.
pub type CommitFormatter = dyn Fn(&CategorizedCommit, &CommitLine) -> String + Send + Sync;

/// Top-level changelog configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogConfig {
    /// How commits are grouped into sections.
    pub categorization: CategorizationConfig,
    /// Which commits are left out entirely.
    #[serde(default)]
    pub filter: FilterConfig,
    /// Output formatting.
    #[serde(default)]
    pub format: FormatConfig,
    /// Release introduction paragraph.
    #[serde(default)]
    pub intro: IntroConfig,
    /// Contributor attribution block.
    #[serde(default)]
    pub contributors: ContributorsConfig,
}

impl ChangelogConfig {
    /// Load and validate a configuration file (`.toml` or `.json`).
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = config::load_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field requirements serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the package strategy has no
    /// `packageNaming`, a mapping target is empty, or a configured plan is not
    /// in the plan label allow-list.
    pub fn validate(&self) -> Result<()> {
        let categorization = &self.categorization;
        if categorization.strategy == Strategy::Package {
            let naming = categorization.package_naming.as_ref().ok_or_else(|| {
                Error::Config(
                    "categorization.packageNaming is required when strategy is \"package\"".into(),
                )
            })?;
            naming.validate(&categorization.labels.plan.values)?;
        }
        Ok(())
    }
}

/// Categorization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One section per `component:` label.
    Component,
    /// One section per package resolved from `scope:` labels.
    Package,
}

/// Categorization settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizationConfig {
    /// Strategy used to derive category keys.
    pub strategy: Strategy,
    /// Label parsing rules.
    #[serde(default)]
    pub labels: LabelConfig,
    /// Package naming, required by [`Strategy::Package`].
    #[serde(default)]
    pub package_naming: Option<PackageNamingConfig>,
    /// Section fallback, ordering and titles.
    #[serde(default)]
    pub sections: SectionConfig,
}

/// Plan label allow-list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlanLabelConfig {
    /// Accepted plan values (compared lower-cased).
    pub values: Vec<String>,
}

impl PlanLabelConfig {
    /// Whether `plan` (already lower-cased) is allowed.
    #[must_use]
    pub fn allows(&self, plan: &str) -> bool {
        self.values.iter().any(|v| v.to_lowercase() == plan)
    }
}

/// Label parsing rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelConfig {
    /// Prefixes marking scope labels; the first matching prefix wins.
    pub scope: Vec<String>,
    /// Prefixes marking component labels; the first matching prefix wins.
    pub component: Vec<String>,
    /// Plan allow-list for `plan:` labels.
    pub plan: PlanLabelConfig,
    /// Exact label → prefix rendered in front of the commit line.
    pub flags: BTreeMap<String, String>,
    /// Exact label → category key that replaces strategy resolution.
    pub category_overrides: BTreeMap<String, String>,
    /// Derives extra labels from the commit title.
    #[serde(skip)]
    pub extract_labels_from_title: Option<Hook<TitleLabelExtractor>>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            scope: vec!["scope:".to_string()],
            component: vec!["component:".to_string()],
            plan: PlanLabelConfig::default(),
            flags: BTreeMap::new(),
            category_overrides: BTreeMap::new(),
            extract_labels_from_title: None,
        }
    }
}

/// Variant packages published for one plan tier.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMapping {
    /// Plan name, e.g. `pro`.
    pub name: String,
    /// Base package → plan package.
    #[serde(default)]
    pub packages: BTreeMap<String, String>,
}

/// Package naming for the package strategy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageNamingConfig {
    /// Scope → base package name.
    pub mappings: BTreeMap<String, String>,
    /// Plan tiers in declaration order.
    pub plans: Vec<PlanMapping>,
    /// Scopes used verbatim as category keys.
    pub generic_scopes: Vec<String>,
}

impl PackageNamingConfig {
    fn validate(&self, allowed_plans: &[String]) -> Result<()> {
        for (scope, package) in &self.mappings {
            if package.trim().is_empty() {
                return Err(Error::Config(format!(
                    "packageNaming.mappings.\"{scope}\" must be a non-empty package name"
                )));
            }
        }
        let mut seen = Vec::new();
        for plan in &self.plans {
            let name = plan.name.to_lowercase();
            if !allowed_plans.iter().any(|p| p.to_lowercase() == name) {
                return Err(Error::Config(format!(
                    "packageNaming plan \"{}\" is not listed in categorization.labels.plan.values",
                    plan.name
                )));
            }
            if seen.contains(&name) {
                return Err(Error::Config(format!(
                    "packageNaming plan \"{}\" is declared more than once",
                    plan.name
                )));
            }
            for (base, variant) in &plan.packages {
                if variant.trim().is_empty() {
                    return Err(Error::Config(format!(
                        "packageNaming plan \"{}\" maps \"{base}\" to an empty package name",
                        plan.name
                    )));
                }
            }
            seen.push(name);
        }
        Ok(())
    }

    /// Whether `scope` is a generic scope.
    #[must_use]
    pub fn is_generic(&self, scope: &str) -> bool {
        self.generic_scopes.iter().any(|s| s == scope)
    }

    /// Plan-specific package for `base`, if configured.
    #[must_use]
    pub fn plan_package(&self, plan: &str, base: &str) -> Option<&str> {
        self.plans
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(plan))
            .and_then(|p| p.packages.get(base))
            .map(String::as_str)
    }

    /// Plan names in declaration order.
    pub fn plan_names(&self) -> impl Iterator<Item = &str> {
        self.plans.iter().map(|p| p.name.as_str())
    }
}

/// Section fallback, ordering and titles.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SectionConfig {
    /// Category key for commits no rule matched.
    pub fallback_section: Option<String>,
    /// Section key → priority; unlisted keys get 0.
    pub order: BTreeMap<String, i32>,
    /// Section key → heading text.
    pub titles: BTreeMap<String, String>,
}

impl SectionConfig {
    /// Heading text for `key`.
    #[must_use]
    pub fn title<'a>(&'a self, key: &'a str) -> &'a str {
        self.titles.get(key).map_or(key, String::as_str)
    }
}

/// A string or regular expression matcher.
///
/// In config files a plain string is a [`Pattern::Text`] and an inline table
/// `{ regex = "..." }` is a [`Pattern::Regex`].
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Literal text.
    Text(String),
    /// Compiled regular expression.
    Regex(Regex),
}

impl Pattern {
    /// Compile a regex pattern.
    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|e| Error::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Substring match for text, search for regex.
    #[must_use]
    pub fn contained_in(&self, value: &str) -> bool {
        match self {
            Self::Text(text) => value.contains(text.as_str()),
            Self::Regex(re) => re.is_match(value),
        }
    }

    /// Exact match for text, search for regex.
    #[must_use]
    pub fn matches_exactly(&self, value: &str) -> bool {
        match self {
            Self::Text(text) => value == text,
            Self::Regex(re) => re.is_match(value),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PatternRepr {
    Text(String),
    Regex { regex: String },
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match PatternRepr::deserialize(deserializer)? {
            PatternRepr::Text(text) => Ok(Self::Text(text)),
            PatternRepr::Regex { regex } => {
                Self::regex(&regex).map_err(serde::de::Error::custom)
            },
        }
    }
}

/// Commit exclusion rules, applied author → labels → custom.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterConfig {
    /// Drop commits whose author login matches.
    pub exclude_authors: Vec<Pattern>,
    /// Drop commits carrying a matching label.
    pub exclude_labels: Vec<Pattern>,
    /// Drop commits for which this returns `false`.
    #[serde(skip)]
    pub custom: Option<Hook<CommitPredicate>>,
}

/// Output formatting.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormatConfig {
    /// Commit line template.
    ///
    /// Placeholders: `{message}`, `{prNumber}`, `{author}`, `{scope}`,
    /// `{plan}`, `{flagPrefix}`, `{tags}`, `{url}`, `{sha}`.
    pub commit_template: String,
    /// Release heading; `{version}` is replaced.
    pub version_header: String,
    /// chrono format string for the release date.
    pub date_format: String,
    /// Whether to emit the `<!-- generated comparing ... -->` comment.
    pub diff_comment: bool,
    /// Plan tier without own changes; `{previous}` names the tier below.
    pub plan_unchanged_message: String,
    /// Plan tier with own changes; `{previous}` and `{count}` are replaced.
    pub plan_plus_message: String,
    /// Printed for a base package subsection without commits.
    pub internal_changes_message: Option<String>,
    /// Plan → markdown appended to plan subsection headings.
    pub plan_badges: BTreeMap<String, String>,
    /// Replaces the template for every commit line.
    #[serde(skip)]
    pub formatter: Option<Hook<CommitFormatter>>,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            commit_template: "- {flagPrefix}{tags}{message} (#{prNumber}) {author}".to_string(),
            version_header: "## {version}".to_string(),
            date_format: "%b %-d, %Y".to_string(),
            diff_comment: true,
            plan_unchanged_message: "Same changes as in `{previous}`.".to_string(),
            plan_plus_message: "Same changes as in `{previous}`, plus:".to_string(),
            internal_changes_message: None,
            plan_badges: BTreeMap::new(),
            formatter: None,
        }
    }
}

/// Release introduction paragraph.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntroConfig {
    /// Whether the introduction is rendered.
    pub enabled: bool,
    /// Thanks line; `{contributorCount}`, `{teamCount}`, `{communityCount}`.
    pub thanks_template: String,
    /// Placeholder line for hand-written highlights.
    pub highlights_placeholder: String,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            thanks_template: "We'd like to extend a big thank you to the {contributorCount} \
                              contributors who made this release possible. Here are some \
                              highlights ✨:"
                .to_string(),
            highlights_placeholder: "TODO INSERT HIGHLIGHTS".to_string(),
        }
    }
}

/// Where the contributor block goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributorsPlacement {
    /// Right after the introduction.
    Early,
    /// After every section.
    #[default]
    Late,
}

/// Contributor attribution block.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContributorsConfig {
    /// Whether the block is rendered.
    pub enabled: bool,
    /// Placement in the output.
    pub placement: ContributorsPlacement,
    /// Logins always counted as team members.
    pub team_members: Vec<String>,
    /// Heading of the team list.
    pub team_heading: String,
    /// Heading of the community list.
    pub community_heading: String,
}

impl Default for ContributorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            placement: ContributorsPlacement::Late,
            team_members: Vec::new(),
            team_heading: "The following team members contributed to this release:".to_string(),
            community_heading:
                "Special thanks go out to the community members for their valuable contributions:"
                    .to_string(),
        }
    }
}
