//! Commit exclusion.

use tracing::debug;

use super::config::FilterConfig;
use super::types::Commit;

/// Return the commits that survive `config`, leaving the input untouched.
///
/// Rules run in order (author, labels, custom predicate) and the first
/// failing rule drops the commit.
#[must_use]
pub fn filter_commits(commits: &[Commit], config: Option<&FilterConfig>) -> Vec<Commit> {
    let Some(config) = config else {
        return commits.to_vec();
    };

    let kept: Vec<Commit> = commits
        .iter()
        .filter(|commit| keep(commit, config))
        .cloned()
        .collect();
    debug!(
        total = commits.len(),
        kept = kept.len(),
        "filtered commits"
    );
    kept
}

fn keep(commit: &Commit, config: &FilterConfig) -> bool {
    if let Some(author) = &commit.author {
        if config
            .exclude_authors
            .iter()
            .any(|pattern| pattern.contained_in(&author.login))
        {
            return false;
        }
    }

    if commit.labels.iter().any(|label| {
        config
            .exclude_labels
            .iter()
            .any(|pattern| pattern.matches_exactly(label))
    }) {
        return false;
    }

    config
        .custom
        .as_ref()
        .is_none_or(|predicate| (predicate.get())(commit))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::changelog::config::{CommitPredicate, Hook, Pattern};
    use crate::changelog::types::{Author, AuthorAssociation};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn commit(pr: u64, login: &str, labels: &[&str]) -> Commit {
        Commit {
            sha: format!("sha{pr}"),
            message: format!("Change {pr}"),
            labels: labels.iter().map(ToString::to_string).collect(),
            pr_number: pr,
            url: String::new(),
            author: Some(Author {
                login: login.into(),
                association: AuthorAssociation::Contributor,
            }),
            merged_at: None,
            created_at: None,
        }
    }

    fn prs(commits: &[Commit]) -> Vec<u64> {
        commits.iter().map(|c| c.pr_number).collect()
    }

    #[test]
    fn test_no_config_keeps_everything() {
        let commits = vec![commit(1, "a", &[]), commit(2, "b", &[])];
        assert_eq!(filter_commits(&commits, None), commits);
    }

    #[test]
    fn test_author_substring_and_regex() {
        let config = FilterConfig {
            exclude_authors: vec![
                Pattern::Text("[bot]".into()),
                Pattern::regex("^renovate").unwrap(),
            ],
            ..FilterConfig::default()
        };
        let commits = vec![
            commit(1, "dependabot[bot]", &[]),
            commit(2, "renovate-helper", &[]),
            commit(3, "alice", &[]),
        ];
        assert_eq!(prs(&filter_commits(&commits, Some(&config))), vec![3]);
    }

    #[test]
    fn test_label_exact_membership() {
        let config = FilterConfig {
            exclude_labels: vec![Pattern::Text("skip changelog".into())],
            ..FilterConfig::default()
        };
        let commits = vec![
            commit(1, "a", &["skip changelog"]),
            commit(2, "a", &["skip changelog please"]),
        ];
        assert_eq!(prs(&filter_commits(&commits, Some(&config))), vec![2]);
    }

    #[test]
    fn test_custom_predicate() {
        let predicate: Arc<CommitPredicate> = Arc::new(|c: &Commit| c.pr_number % 2 == 0);
        let config = FilterConfig {
            custom: Some(Hook(predicate)),
            ..FilterConfig::default()
        };
        let commits = (1..=4).map(|pr| commit(pr, "a", &[])).collect::<Vec<_>>();
        assert_eq!(prs(&filter_commits(&commits, Some(&config))), vec![2, 4]);
    }

    #[test]
    fn test_commits_without_author_pass_author_rule() {
        let config = FilterConfig {
            exclude_authors: vec![Pattern::Text(String::new())],
            ..FilterConfig::default()
        };
        let mut c = commit(1, "a", &[]);
        c.author = None;
        assert_eq!(filter_commits(&[c], Some(&config)).len(), 1);
    }

    proptest! {
        #[test]
        fn prop_filter_never_mutates_input(
            logins in prop::collection::vec("[a-z]{1,5}", 0..20),
            excluded in "[a-z]{1,2}",
        ) {
            let commits: Vec<Commit> = logins
                .iter()
                .enumerate()
                .map(|(i, login)| commit(i as u64, login, &["scope: docs"]))
                .collect();
            let snapshot = commits.clone();
            let config = FilterConfig {
                exclude_authors: vec![Pattern::Text(excluded)],
                ..FilterConfig::default()
            };
            let kept = filter_commits(&commits, Some(&config));
            prop_assert!(kept.len() <= commits.len());
            prop_assert_eq!(commits, snapshot);
        }
    }
}
