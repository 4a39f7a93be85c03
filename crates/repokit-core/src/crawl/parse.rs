//! HTML link and target extraction.

use std::collections::{BTreeSet, HashMap};

use scraper::{ElementRef, Html, Selector};

use super::options::IgnoreRules;
use super::types::Link;
use crate::{Error, Result};

/// How a response body should be treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    /// `text/html`; links and targets are extracted.
    Html,
    /// Any `image/*` type; skipped quietly.
    Image,
    /// Any other valid media type; skipped with a warning.
    Other(String),
    /// Missing or malformed header; skipped with a warning.
    Invalid(Option<String>),
}

impl ContentKind {
    /// Classify a `Content-Type` header value.
    #[must_use]
    pub fn classify(header: Option<&str>) -> Self {
        let Some(raw) = header else {
            return Self::Invalid(None);
        };
        let media = raw
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let valid = media
            .split_once('/')
            .is_some_and(|(kind, sub)| !kind.is_empty() && !sub.is_empty() && !sub.contains('/'));
        if !valid {
            return Self::Invalid(Some(raw.to_string()));
        }
        if media == "text/html" {
            Self::Html
        } else if media.starts_with("image/") {
            Self::Image
        } else {
            Self::Other(media)
        }
    }

    /// Media type without parameters, if valid.
    #[must_use]
    pub fn media_type(&self) -> Option<String> {
        match self {
            Self::Html => Some("text/html".to_string()),
            Self::Image => Some("image/*".to_string()),
            Self::Other(media) => Some(media.clone()),
            Self::Invalid(_) => None,
        }
    }
}

/// Links and `#id` targets of one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// Links in document order.
    pub links: Vec<Link>,
    /// Targets found on the page.
    pub targets: BTreeSet<String>,
}

/// Extracts links and targets with a fixed set of ignore rules.
#[derive(Debug, Clone)]
pub struct PageParser {
    anchors: Selector,
    with_id: Selector,
    labels: Selector,
    images: Selector,
    rules: IgnoreRules,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::InvalidPattern {
        pattern: css.to_string(),
        reason: e.to_string(),
    })
}

impl PageParser {
    /// Build a parser using `rules`.
    pub fn new(rules: IgnoreRules) -> Result<Self> {
        Ok(Self {
            anchors: selector("a[href]")?,
            with_id: selector("[id]")?,
            labels: selector("label[for]")?,
            images: selector("img[alt]")?,
            rules,
        })
    }

    /// Ignore rules in effect.
    #[must_use]
    pub const fn rules(&self) -> &IgnoreRules {
        &self.rules
    }

    /// Parse `html` served at page path `src`.
    #[must_use]
    pub fn parse(&self, src: &str, html: &str) -> ParsedPage {
        let document = Html::parse_document(html);

        let mut by_id: HashMap<&str, ElementRef<'_>> = HashMap::new();
        let mut targets = BTreeSet::new();
        for element in document.select(&self.with_id) {
            if let Some(id) = element.value().id() {
                by_id.entry(id).or_insert(element);
                if !self.rules.targets.contains(id) {
                    targets.insert(format!("#{id}"));
                }
            }
        }

        let mut label_for: HashMap<&str, ElementRef<'_>> = HashMap::new();
        for label in document.select(&self.labels) {
            if let Some(target) = label.value().attr("for") {
                label_for.entry(target).or_insert(label);
            }
        }

        let links = document
            .select(&self.anchors)
            .filter(|anchor| !self.is_ignored(anchor))
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?;
                Some(Link {
                    src: Some(src.to_string()),
                    text: self.accessible_name(&anchor, &by_id, &label_for),
                    href: href.to_string(),
                })
            })
            .collect();

        ParsedPage { links, targets }
    }

    fn is_ignored(&self, anchor: &ElementRef<'_>) -> bool {
        self.rules.content.iter().any(|selector| {
            selector.matches(anchor)
                || anchor
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|ancestor| selector.matches(&ancestor))
        })
    }

    /// ARIA label, then `aria-labelledby`, then `<label for>`, then image
    /// alt text, then visible text.
    fn accessible_name(
        &self,
        anchor: &ElementRef<'_>,
        by_id: &HashMap<&str, ElementRef<'_>>,
        label_for: &HashMap<&str, ElementRef<'_>>,
    ) -> Option<String> {
        let element = anchor.value();

        if let Some(label) = element.attr("aria-label").and_then(non_empty) {
            return Some(label);
        }

        if let Some(ids) = element.attr("aria-labelledby") {
            let text: Vec<String> = ids
                .split_whitespace()
                .filter_map(|id| by_id.get(id))
                .map(visible_text)
                .filter(|t| !t.is_empty())
                .collect();
            if !text.is_empty() {
                return Some(text.join(" "));
            }
        }

        if let Some(label) = element
            .id()
            .and_then(|id| label_for.get(id))
            .map(visible_text)
            .and_then(|t| non_empty(&t))
        {
            return Some(label);
        }

        if let Some(alt) = anchor
            .select(&self.images)
            .find_map(|img| img.value().attr("alt").and_then(non_empty))
        {
            return Some(alt);
        }

        non_empty(&visible_text(anchor))
    }
}

fn visible_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::crawl::options::CrawlOptions;

    fn parser(ignored_content: &[&str]) -> PageParser {
        let options = CrawlOptions {
            ignored_content: ignored_content.iter().map(ToString::to_string).collect(),
            ..CrawlOptions::default()
        };
        PageParser::new(options.rules().unwrap()).unwrap()
    }

    fn texts(page: &ParsedPage) -> Vec<(String, Option<String>)> {
        page.links
            .iter()
            .map(|l| (l.href.clone(), l.text.clone()))
            .collect()
    }

    #[test]
    fn test_classify_content_type() {
        assert_eq!(ContentKind::classify(Some("text/html; charset=utf-8")), ContentKind::Html);
        assert_eq!(ContentKind::classify(Some("TEXT/HTML")), ContentKind::Html);
        assert_eq!(ContentKind::classify(Some("image/svg+xml")), ContentKind::Image);
        assert_eq!(
            ContentKind::classify(Some("application/json")),
            ContentKind::Other("application/json".into())
        );
        assert_eq!(
            ContentKind::classify(Some("garbage")),
            ContentKind::Invalid(Some("garbage".into()))
        );
        assert_eq!(ContentKind::classify(None), ContentKind::Invalid(None));
    }

    #[test]
    fn test_accessible_name_priority() {
        let html = r#"
            <span id="l1">Labelled</span><span id="l2">twice</span>
            <label for="with-label">From label</label>
            <a href="/aria" aria-label="Aria name">ignored text</a>
            <a href="/labelledby" aria-labelledby="l1 l2 missing">ignored</a>
            <a href="/label" id="with-label">ignored</a>
            <a href="/img"><img src="x.png" alt="Logo"></a>
            <a href="/text">  Plain
                text </a>
            <a href="/empty"></a>
        "#;
        let page = parser(&[]).parse("/", html);
        assert_eq!(
            texts(&page),
            vec![
                ("/aria".to_string(), Some("Aria name".to_string())),
                ("/labelledby".to_string(), Some("Labelled twice".to_string())),
                ("/label".to_string(), Some("From label".to_string())),
                ("/img".to_string(), Some("Logo".to_string())),
                ("/text".to_string(), Some("Plain text".to_string())),
                ("/empty".to_string(), None),
            ]
        );
        assert!(page.links.iter().all(|l| l.src.as_deref() == Some("/")));
    }

    #[test]
    fn test_targets_skip_ignored_ids() {
        let html = r#"<div id="__next"><h2 id="usage">Usage</h2><p id="api"></p></div>"#;
        let page = parser(&[]).parse("/docs", html);
        let targets: Vec<&str> = page.targets.iter().map(String::as_str).collect();
        assert_eq!(targets, vec!["#api", "#usage"]);
    }

    #[test]
    fn test_ignored_content() {
        let html = r#"
            <nav class="skip"><a href="/in-nav">Nav</a></nav>
            <a class="edit" href="/edit">Edit</a>
            <a href="/kept">Kept</a>
        "#;
        let page = parser(&[".skip", "a.edit"]).parse("/", html);
        let hrefs: Vec<&str> = page.links.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(hrefs, vec!["/kept"]);
    }
}
