//! Commit sources.
//!
//! The pipeline itself only needs a `Vec<Commit>`. [`GitHubCommitSource`]
//! builds it from the GitHub REST API (compare endpoint, then one pull
//! request lookup per commit); [`JsonCommitSource`] reads a file of commit
//! records, which is what tests and offline runs use.

use std::path::PathBuf;
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use regex::Regex;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::types::{Author, AuthorAssociation, Commit};
use crate::{Error, Result};

/// Default GitHub API endpoint.
pub const GITHUB_API: &str = "https://api.github.com";

const PAGE_SIZE: usize = 100;
const PULL_CONCURRENCY: usize = 8;

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static PR_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(#(\d+)\)\s*$").unwrap());

/// A range of history between two refs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRange {
    /// Older ref (exclusive).
    pub from: String,
    /// Newer ref (inclusive).
    pub to: String,
}

/// Something that can list the commits of a release.
#[async_trait]
pub trait CommitSource: Send + Sync {
    /// Fetch the commits in `range`, oldest first.
    async fn fetch_commits(&self, range: &CommitRange) -> Result<Vec<Commit>>;
}

/// Extract the trailing `(#N)` pull request number of a commit title.
#[must_use]
pub fn pr_number_from_title(title: &str) -> Option<u64> {
    PR_REFERENCE
        .captures(title.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[derive(Debug, Deserialize)]
struct CompareResponse {
    #[serde(default)]
    total_commits: usize,
    #[serde(default)]
    commits: Vec<CompareCommit>,
}

#[derive(Debug, Deserialize)]
struct CompareCommit {
    sha: String,
    commit: CompareCommitDetail,
}

#[derive(Debug, Deserialize)]
struct CompareCommitDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    labels: Vec<PullLabel>,
    user: Option<PullUser>,
    #[serde(default)]
    author_association: String,
    merged_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct PullLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PullUser {
    login: String,
}

/// Commit source backed by the GitHub REST API.
pub struct GitHubCommitSource {
    client: Client,
    api_base: String,
    owner: String,
    repo: String,
    token: Option<String>,
}

impl GitHubCommitSource {
    /// Create a source for `owner/repo` using the public API endpoint.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("repokit/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self {
            client,
            api_base: GITHUB_API.to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token: None,
        })
    }

    /// Parse an `owner/repo` slug.
    pub fn from_slug(slug: &str) -> Result<Self> {
        match slug.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Self::new(owner, repo)
            },
            _ => Err(Error::Config(format!(
                "Invalid repository '{slug}': expected owner/name"
            ))),
        }
    }

    /// Point the source at a different API endpoint (GitHub Enterprise, tests).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Authenticate requests with a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!(
                "GitHub resource not found at '{url}'. Check the repository and refs"
            )));
        }
        let body = response.error_for_status()?.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Parse(format!("Unexpected GitHub response from '{url}': {e}")))
    }

    async fn compare(&self, range: &CommitRange) -> Result<Vec<CompareCommit>> {
        let mut commits = Vec::new();
        let mut page = 1;
        loop {
            let url = format!(
                "{}/repos/{}/{}/compare/{}...{}?per_page={PAGE_SIZE}&page={page}",
                self.api_base, self.owner, self.repo, range.from, range.to
            );
            let response: CompareResponse = self.get_json(&url).await?;
            let received = response.commits.len();
            commits.extend(response.commits);
            debug!(page, received, total = response.total_commits, "compare page");
            if received < PAGE_SIZE || commits.len() >= response.total_commits {
                break;
            }
            page += 1;
        }
        Ok(commits)
    }

    async fn pull_request(&self, number: u64) -> Result<PullRequest> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{number}",
            self.api_base, self.owner, self.repo
        );
        self.get_json(&url).await
    }
}

#[async_trait]
impl CommitSource for GitHubCommitSource {
    async fn fetch_commits(&self, range: &CommitRange) -> Result<Vec<Commit>> {
        let compared = self.compare(range).await?;
        info!(
            repo = %format!("{}/{}", self.owner, self.repo),
            from = %range.from,
            to = %range.to,
            commits = compared.len(),
            "fetched commit range"
        );

        let with_pr: Vec<(usize, u64, CompareCommit)> = compared
            .into_iter()
            .enumerate()
            .filter_map(|(index, commit)| {
                let title = commit.commit.message.lines().next().unwrap_or_default();
                match pr_number_from_title(title) {
                    Some(number) => Some((index, number, commit)),
                    None => {
                        debug!(sha = %commit.sha, "commit has no pull request reference, skipping");
                        None
                    },
                }
            })
            .collect();

        let mut resolved: Vec<(usize, Result<Commit>)> = stream::iter(with_pr)
            .map(|(index, number, compared)| async move {
                let result = self.pull_request(number).await.map(|pull| Commit {
                    sha: compared.sha,
                    message: compared.commit.message,
                    labels: pull.labels.into_iter().map(|l| l.name).collect(),
                    pr_number: number,
                    url: pull.html_url,
                    author: pull.user.map(|user| Author {
                        login: user.login,
                        association: AuthorAssociation::from_github(&pull.author_association),
                    }),
                    merged_at: pull.merged_at,
                    created_at: pull.created_at,
                });
                (index, result)
            })
            .buffer_unordered(PULL_CONCURRENCY)
            .collect()
            .await;

        resolved.sort_by_key(|(index, _)| *index);
        resolved.into_iter().map(|(_, commit)| commit).collect()
    }
}

/// Commit source reading a JSON array of commit records.
#[derive(Debug, Clone)]
pub struct JsonCommitSource {
    path: PathBuf,
}

impl JsonCommitSource {
    /// Read commits from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CommitSource for JsonCommitSource {
    async fn fetch_commits(&self, _range: &CommitRange) -> Result<Vec<Commit>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("Commit file '{}' does not exist", self.path.display()))
            } else {
                Error::Io(e)
            }
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::Parse(format!(
                "Invalid commit file '{}': {e}",
                self.path.display()
            ))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn range() -> CommitRange {
        CommitRange {
            from: "v1.0.0".into(),
            to: "master".into(),
        }
    }

    #[test]
    fn test_pr_number_from_title() {
        assert_eq!(pr_number_from_title("[docs] Fix typo (#1234)"), Some(1234));
        assert_eq!(pr_number_from_title("Fix (#1) and more (#22) "), Some(22));
        assert_eq!(pr_number_from_title("Bump version"), None);
    }

    #[test]
    fn test_from_slug() {
        assert!(GitHubCommitSource::from_slug("mui/mui-x").is_ok());
        assert!(GitHubCommitSource::from_slug("mui").is_err());
        assert!(GitHubCommitSource::from_slug("a/b/c").is_err());
    }

    async fn mount_pull(server: &MockServer, number: u64, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/mui/mui-x/pulls/{number}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_commits_from_github() -> anyhow::Result<()> {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/mui/mui-x/compare/v1.0.0...master"))
            .and(query_param("page", "1"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_commits": 3,
                "commits": [
                    {"sha": "a1", "commit": {"message": "[DataGrid] Fix rows (#11)\n\nbody"}},
                    {"sha": "b2", "commit": {"message": "Bump version"}},
                    {"sha": "c3", "commit": {"message": "[docs] Typo (#12)"}}
                ]
            })))
            .mount(&server)
            .await;

        mount_pull(
            &server,
            11,
            json!({
                "html_url": "https://github.com/mui/mui-x/pull/11",
                "labels": [{"name": "scope: data grid"}, {"name": "plan: pro"}],
                "user": {"login": "alice"},
                "author_association": "MEMBER",
                "merged_at": "2025-01-02T03:04:05Z",
                "created_at": "2025-01-01T00:00:00Z"
            }),
        )
        .await;
        mount_pull(
            &server,
            12,
            json!({
                "labels": [{"name": "scope: docs"}],
                "user": {"login": "bob"},
                "author_association": "FIRST_TIME_CONTRIBUTOR",
                "merged_at": null
            }),
        )
        .await;

        let source = GitHubCommitSource::new("mui", "mui-x")?
            .with_api_base(server.uri())
            .with_token(Some("secret".into()));
        let commits = source.fetch_commits(&range()).await?;

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].sha, "a1");
        assert_eq!(commits[0].pr_number, 11);
        assert_eq!(commits[0].labels, vec!["scope: data grid", "plan: pro"]);
        assert_eq!(
            commits[0].author.as_ref().unwrap().association,
            AuthorAssociation::Team
        );
        assert!(commits[0].merged_at.is_some());
        assert_eq!(commits[1].pr_number, 12);
        assert_eq!(
            commits[1].author.as_ref().unwrap().association,
            AuthorAssociation::FirstTimer
        );
        assert!(commits[1].merged_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_ref_is_not_found() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = GitHubCommitSource::new("mui", "mui-x")?.with_api_base(server.uri());
        let err = source.fetch_commits(&range()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "{err}");
        Ok(())
    }

    #[tokio::test]
    async fn test_json_commit_source() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("commits.json");
        std::fs::write(
            &file,
            r#"[{"sha":"1","message":"[docs] Fix (#5)","labels":["scope: docs"],"prNumber":5}]"#,
        )?;
        let commits = JsonCommitSource::new(&file).fetch_commits(&range()).await?;
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].labels, vec!["scope: docs"]);

        let missing = JsonCommitSource::new(dir.path().join("none.json"))
            .fetch_commits(&range())
            .await
            .unwrap_err();
        assert!(matches!(missing, Error::NotFound(_)));
        Ok(())
    }
}
