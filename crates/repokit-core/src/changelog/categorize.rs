//! Commit categorization.
//!
//! Every commit resolves to one or more category keys. A category override
//! always wins; otherwise the configured [`Strategy`] decides:
//!
//! - **component**: one key per `component:` label, or the fallback section.
//! - **package**: one key per `scope:` label. Generic scopes are used
//!   verbatim, every other scope must map to a base package, and a plan label
//!   swaps the base package for its plan variant.
//!
//! Missing package mappings are configuration mistakes and abort the run with
//! [`Error::MissingMapping`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::config::{CategorizationConfig, PackageNamingConfig, Strategy};
use super::types::{CategorizedCommit, CategoryMap, SharedCommit};
use crate::error::MappingKind;
use crate::{Error, Result};

/// Group `commits` by category key.
///
/// Each key's list keeps input order. A commit filed under several keys is
/// shared, not copied.
pub fn categorize_commits(
    commits: Vec<CategorizedCommit>,
    config: &CategorizationConfig,
) -> Result<CategoryMap> {
    let mut categories: CategoryMap = BTreeMap::new();

    for commit in commits {
        let keys = category_keys(&commit, config)?;
        if keys.is_empty() {
            debug!(pr = commit.commit.pr_number, "commit has no category, skipping");
            continue;
        }
        let shared: SharedCommit = Arc::new(commit);
        for key in keys {
            let bucket = categories.entry(key).or_default();
            if !bucket.iter().any(|c| Arc::ptr_eq(c, &shared)) {
                bucket.push(Arc::clone(&shared));
            }
        }
    }

    Ok(categories)
}

/// Resolve the category keys of a single commit.
///
/// An empty result means no rule applied and no fallback section is set.
pub fn category_keys(
    commit: &CategorizedCommit,
    config: &CategorizationConfig,
) -> Result<Vec<String>> {
    if let Some(category) = &commit.parsed.category_override {
        return Ok(vec![category.clone()]);
    }

    let fallback = || -> Vec<String> { config.sections.fallback_section.iter().cloned().collect() };

    match config.strategy {
        Strategy::Component => {
            if commit.parsed.components.is_empty() {
                Ok(fallback())
            } else {
                Ok(commit.parsed.components.clone())
            }
        },
        Strategy::Package => {
            if commit.parsed.scopes.is_empty() {
                return Ok(fallback());
            }
            let naming = config.package_naming.as_ref().ok_or_else(|| {
                Error::Config(
                    "categorization.packageNaming is required when strategy is \"package\"".into(),
                )
            })?;
            commit
                .parsed
                .scopes
                .iter()
                .map(|scope| package_key(scope, commit, naming))
                .collect()
        },
    }
}

fn package_key(
    scope: &str,
    commit: &CategorizedCommit,
    naming: &PackageNamingConfig,
) -> Result<String> {
    if naming.is_generic(scope) {
        return Ok(scope.to_string());
    }

    let pr = commit.commit.pr_number;
    let base = naming
        .mappings
        .get(scope)
        .ok_or_else(|| Error::MissingMapping {
            kind: MappingKind::Scope,
            name: scope.to_string(),
            pr,
        })?;

    let Some(plan) = &commit.parsed.plan else {
        return Ok(base.clone());
    };

    match naming.plans.iter().find(|p| p.name.eq_ignore_ascii_case(plan)) {
        // Plan tier is configured: its package table must cover the base.
        Some(tier) => tier
            .packages
            .get(base)
            .cloned()
            .ok_or_else(|| Error::MissingMapping {
                kind: MappingKind::Plan(plan.clone()),
                name: base.clone(),
                pr,
            }),
        None => Ok(base.clone()),
    }
}
