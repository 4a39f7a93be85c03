//! Label parsing.
//!
//! Raw labels are matched against four rule families, checked in this order
//! for every label: category overrides, scope prefixes, component prefixes,
//! the `plan:` prefix and finally the exact flag table. The first family that
//! matches consumes the label; anything left over is ignored.

use super::config::LabelConfig;
use super::types::{Commit, ParsedLabels};

/// Fixed prefix of plan labels.
pub const PLAN_PREFIX: &str = "plan:";

/// Parse the labels of `commit`.
///
/// When a title extractor is configured, its labels are merged into
/// `commit.labels` first (set union, existing order kept). This is the only
/// mutation applied to a commit during a run.
pub fn parse_labels(commit: &mut Commit, config: &LabelConfig) -> ParsedLabels {
    if let Some(extract) = &config.extract_labels_from_title {
        let extra = (extract.get())(commit.first_line());
        commit.merge_labels(extra);
    }
    parse_label_list(&commit.labels, config)
}

/// Parse a label list without touching any commit.
#[must_use]
pub fn parse_label_list(labels: &[String], config: &LabelConfig) -> ParsedLabels {
    let mut parsed = ParsedLabels::default();

    for label in labels {
        if let Some(category) = config.category_overrides.get(label) {
            parsed.category_override = Some(category.clone());
        } else if let Some(scope) = strip_any_prefix(label, &config.scope) {
            parsed.scopes.push(scope.to_string());
        } else if let Some(component) = strip_any_prefix(label, &config.component) {
            parsed.components.push(component.to_string());
        } else if let Some(plan) = label.strip_prefix(PLAN_PREFIX) {
            let plan = plan.trim().to_lowercase();
            if config.plan.allows(&plan) {
                parsed.plan = Some(plan);
            }
        } else if config.flags.contains_key(label) {
            parsed.flags.push(label.clone());
        }
    }

    parsed
}

/// Strip the first matching prefix and trim the remainder.
fn strip_any_prefix<'a>(label: &'a str, prefixes: &[String]) -> Option<&'a str> {
    prefixes
        .iter()
        .find_map(|prefix| label.strip_prefix(prefix.as_str()))
        .map(str::trim)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::changelog::config::{Hook, PlanLabelConfig, TitleLabelExtractor};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn config() -> LabelConfig {
        let mut config = LabelConfig {
            plan: PlanLabelConfig {
                values: vec!["pro".into(), "premium".into()],
            },
            ..LabelConfig::default()
        };
        config
            .flags
            .insert("breaking change".into(), "**Breaking change**".into());
        config
            .category_overrides
            .insert("all components".into(), "General changes".into());
        config
            .category_overrides
            .insert("dependencies".into(), "Dependencies".into());
        config
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn commit(items: &[&str], message: &str) -> Commit {
        Commit {
            sha: "1".into(),
            message: message.into(),
            labels: labels(items),
            pr_number: 10,
            url: String::new(),
            author: None,
            merged_at: None,
            created_at: None,
        }
    }

    #[test]
    fn test_scopes_and_components_accumulate() {
        let parsed = parse_label_list(
            &labels(&["scope: data grid", "scope:charts", "component: Button", "unrelated"]),
            &config(),
        );
        assert_eq!(parsed.scopes, vec!["data grid", "charts"]);
        assert_eq!(parsed.components, vec!["Button"]);
        assert!(parsed.plan.is_none());
        assert!(parsed.flags.is_empty());
    }

    #[test]
    fn test_first_matching_prefix_wins() {
        let mut config = config();
        config.scope = vec!["scope:".into(), "scope: ".into()];
        let parsed = parse_label_list(&labels(&["scope: docs"]), &config);
        assert_eq!(parsed.scopes, vec!["docs"]);
    }

    #[test]
    fn test_plan_is_case_folded_and_validated() {
        let config = config();
        let parsed = parse_label_list(&labels(&["plan: Pro"]), &config);
        assert_eq!(parsed.plan.as_deref(), Some("pro"));
        let parsed = parse_label_list(&labels(&["plan: enterprise"]), &config);
        assert!(parsed.plan.is_none());
    }

    #[test]
    fn test_last_plan_wins() {
        let parsed = parse_label_list(&labels(&["plan: pro", "plan: premium"]), &config());
        assert_eq!(parsed.plan.as_deref(), Some("premium"));
    }

    #[test]
    fn test_flags_need_exact_match() {
        let parsed =
            parse_label_list(&labels(&["Breaking change", "breaking change"]), &config());
        assert_eq!(parsed.flags, vec!["breaking change"]);
    }

    #[test]
    fn test_override_consumes_label() {
        let mut config = config();
        config
            .category_overrides
            .insert("scope: docs".into(), "Docs".into());
        let parsed = parse_label_list(&labels(&["scope: docs", "scope: charts"]), &config);
        assert_eq!(parsed.category_override.as_deref(), Some("Docs"));
        assert_eq!(parsed.scopes, vec!["charts"]);
    }

    #[test]
    fn test_last_override_wins() {
        let parsed = parse_label_list(&labels(&["dependencies", "all components"]), &config());
        assert_eq!(parsed.category_override.as_deref(), Some("General changes"));
    }

    #[test]
    fn test_title_extraction_merges_labels() {
        let mut config = config();
        let extract: Arc<TitleLabelExtractor> = Arc::new(|title: &str| {
            if title.starts_with("[docs]") {
                vec!["scope: docs".to_string(), "scope: charts".to_string()]
            } else {
                Vec::new()
            }
        });
        config.extract_labels_from_title = Some(Hook(extract));
        let mut c = commit(&["scope: charts"], "[docs] Fix typo (#10)");
        let parsed = parse_labels(&mut c, &config);
        assert_eq!(c.labels, vec!["scope: charts", "scope: docs"]);
        assert_eq!(parsed.scopes, vec!["charts", "docs"]);
    }

    proptest! {
        #[test]
        fn prop_last_override_wins_regardless_of_position(
            before in prop::collection::vec("scope: [a-z]{1,6}", 0..4),
            after in prop::collection::vec("component: [A-Z][a-z]{1,6}", 0..4),
        ) {
            let mut all = before.clone();
            all.push("dependencies".into());
            all.extend(after.iter().cloned());
            all.push("all components".into());
            let parsed = parse_label_list(&all, &config());
            prop_assert_eq!(parsed.category_override.as_deref(), Some("General changes"));
            prop_assert_eq!(parsed.scopes.len(), before.len());
            prop_assert_eq!(parsed.components.len(), after.len());
        }
    }
}
