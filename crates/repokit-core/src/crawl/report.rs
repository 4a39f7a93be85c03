//! Plain-text crawl report.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use super::types::{CrawlResult, Issue, IssueKind};

const SEED_SOURCE: &str = "(seed)";

/// Render issues grouped by source page, followed by a summary line.
///
/// ```text
/// Broken links on /docs:
///   [broken-link] /missing ("Missing page"): Page returned status 404
///
/// Checked 12 links on 4 pages in 0.3s: 1 broken-link, 0 broken-target
/// ```
#[must_use]
pub fn render_text(result: &CrawlResult, elapsed: Duration) -> String {
    let mut by_source: BTreeMap<&str, Vec<&Issue>> = BTreeMap::new();
    for issue in &result.issues {
        let source = issue.link.src.as_deref().unwrap_or(SEED_SOURCE);
        by_source.entry(source).or_default().push(issue);
    }

    let mut out = String::new();
    for (source, issues) in &by_source {
        let _ = writeln!(out, "Broken links on {source}:");
        for issue in issues {
            let _ = write!(out, "  [{}] {}", issue.kind, issue.link.href);
            if let Some(text) = &issue.link.text {
                let _ = write!(out, " (\"{text}\")");
            }
            let _ = writeln!(out, ": {}", issue.message);
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "Checked {} links on {} pages in {:.1}s: {} {}, {} {}",
        result.links.len(),
        result.pages.len(),
        elapsed.as_secs_f64(),
        result.count(IssueKind::BrokenLink),
        IssueKind::BrokenLink,
        result.count(IssueKind::BrokenTarget),
        IssueKind::BrokenTarget,
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::types::Link;

    fn issue(kind: IssueKind, src: Option<&str>, href: &str, text: Option<&str>) -> Issue {
        Issue {
            kind,
            link: Link {
                src: src.map(str::to_string),
                text: text.map(str::to_string),
                href: href.to_string(),
            },
            message: "nope".to_string(),
        }
    }

    #[test]
    fn test_groups_by_source() {
        let result = CrawlResult {
            issues: vec![
                issue(IssueKind::BrokenTarget, Some("/b"), "/a#x", None),
                issue(IssueKind::BrokenLink, Some("/a"), "/gone", Some("Gone")),
                issue(IssueKind::BrokenLink, None, "/start", None),
                issue(IssueKind::BrokenLink, Some("/a"), "/also-gone", None),
            ],
            ..CrawlResult::default()
        };
        let text = render_text(&result, Duration::from_millis(1500));
        assert_eq!(
            text,
            "Broken links on (seed):\n  [broken-link] /start: nope\n\n\
             Broken links on /a:\n  [broken-link] /gone (\"Gone\"): nope\n  [broken-link] /also-gone: nope\n\n\
             Broken links on /b:\n  [broken-target] /a#x: nope\n\n\
             Checked 0 links on 0 pages in 1.5s: 3 broken-link, 1 broken-target\n"
        );
    }

    #[test]
    fn test_clean_crawl_is_summary_only() {
        let text = render_text(&CrawlResult::default(), Duration::ZERO);
        assert_eq!(
            text,
            "Checked 0 links on 0 pages in 0.0s: 0 broken-link, 0 broken-target\n"
        );
    }
}
