//! Page path and fragment normalization.

use url::Url;

use super::options::IgnoreRules;
use crate::{Error, Result};

const PATH_BASE: &str = "http://localhost";

/// Split `href` into the part before `#` and the `#fragment`, if any.
///
/// An empty fragment (`/docs#`) counts as none.
#[must_use]
pub fn split_fragment(href: &str) -> (&str, Option<&str>) {
    match href.find('#') {
        Some(index) if index + 1 < href.len() => (&href[..index], Some(&href[index..])),
        Some(index) => (&href[..index], None),
        None => (href, None),
    }
}

/// Normalize an internal `href` into a page path.
///
/// Returns `None` for links that are not crawled: anything not starting with
/// a single `/`, and paths matching an ignore rule. The fragment is dropped,
/// a non-empty query kept, and a trailing slash removed except on `/`.
#[must_use]
pub fn page_path(href: &str, rules: &IgnoreRules) -> Option<String> {
    let (path, query) = resolve(href)?;
    if rules.ignores_path(&path) {
        return None;
    }
    Some(with_query(path, query.as_deref()))
}

/// [`page_path`] without ignore rules, for page keys taken from
/// configuration and manifests.
#[must_use]
pub fn canonical_path(href: &str) -> Option<String> {
    let (path, query) = resolve(href)?;
    Some(with_query(path, query.as_deref()))
}

fn resolve(href: &str) -> Option<(String, Option<String>)> {
    if !href.starts_with('/') || href.starts_with("//") {
        return None;
    }
    let (without_fragment, _) = split_fragment(href);
    let base = Url::parse(PATH_BASE).ok()?;
    let url = base.join(without_fragment).ok()?;

    let mut path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    let query = url.query().filter(|q| !q.is_empty()).map(str::to_string);
    Some((path, query))
}

fn with_query(mut path: String, query: Option<&str>) -> String {
    if let Some(query) = query {
        path.push('?');
        path.push_str(query);
    }
    path
}

/// Absolute URL of `path` on `host`.
pub fn page_url(host: &Url, path: &str) -> Result<Url> {
    host.join(path)
        .map_err(|e| Error::Parse(format!("Invalid page path '{path}': {e}")))
}

/// Parse the crawl host.
pub fn parse_host(host: &str) -> Result<Url> {
    Url::parse(host).map_err(|e| Error::Config(format!("Invalid host '{host}': {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::crawl::options::CrawlOptions;

    fn rules(ignored: &[&str]) -> IgnoreRules {
        CrawlOptions {
            ignored_paths: ignored.iter().map(ToString::to_string).collect(),
            ..CrawlOptions::default()
        }
        .rules()
        .unwrap()
    }

    #[test]
    fn test_trailing_slash_and_query() {
        let rules = rules(&[]);
        assert_eq!(page_path("/docs/", &rules).as_deref(), Some("/docs"));
        assert_eq!(page_path("/docs", &rules).as_deref(), Some("/docs"));
        assert_eq!(page_path("/docs?x=1", &rules).as_deref(), Some("/docs?x=1"));
        assert_eq!(page_path("/docs/?x=1", &rules).as_deref(), Some("/docs?x=1"));
        assert_eq!(page_path("/", &rules).as_deref(), Some("/"));
    }

    #[test]
    fn test_empty_query_is_dropped() {
        let rules = rules(&[]);
        assert_eq!(page_path("/docs/?", &rules).as_deref(), Some("/docs"));
        assert_eq!(page_path("/docs?#intro", &rules).as_deref(), Some("/docs"));
        assert_eq!(canonical_path("/?").as_deref(), Some("/"));
    }

    #[test]
    fn test_canonical_path_ignores_nothing() {
        let rules = rules(&["^/api/"]);
        assert_eq!(page_path("/api/button/", &rules), None);
        assert_eq!(canonical_path("/api/button/").as_deref(), Some("/api/button"));
        assert_eq!(canonical_path("x/grid"), None);
    }

    #[test]
    fn test_fragment_is_dropped() {
        let rules = rules(&[]);
        assert_eq!(page_path("/docs/#intro", &rules).as_deref(), Some("/docs"));
        assert_eq!(
            split_fragment("/docs#intro"),
            ("/docs", Some("#intro"))
        );
        assert_eq!(split_fragment("/docs#"), ("/docs", None));
    }

    #[test]
    fn test_external_and_ignored_links() {
        let rules = rules(&["^/api/"]);
        assert_eq!(page_path("https://github.com", &rules), None);
        assert_eq!(page_path("//cdn.example.com/x.js", &rules), None);
        assert_eq!(page_path("relative/page", &rules), None);
        assert_eq!(page_path("#same-page", &rules), None);
        assert_eq!(page_path("mailto:team@example.com", &rules), None);
        assert_eq!(page_path("/api/button", &rules), None);
        assert_eq!(page_path("/docs/api/button", &rules).as_deref(), Some("/docs/api/button"));
    }

    #[test]
    fn test_dot_segments_resolve() {
        let rules = rules(&[]);
        assert_eq!(page_path("/docs/../blog/", &rules).as_deref(), Some("/blog"));
    }

    #[test]
    fn test_page_url() {
        let host = parse_host("http://localhost:3000").unwrap();
        assert_eq!(
            page_url(&host, "/docs?x=1").unwrap().as_str(),
            "http://localhost:3000/docs?x=1"
        );
        assert!(parse_host("not a url").is_err());
    }
}
