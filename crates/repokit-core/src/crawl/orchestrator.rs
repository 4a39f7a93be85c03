//! Crawl orchestration.
//!
//! A crawl runs in phases:
//!
//! 1. optionally start the site's server and wait for it
//! 2. resolve known targets (downloads plus configured entries)
//! 3. crawl from the seed URLs until no page discovers anything new
//! 4. stop the server
//! 5. check every discovered link against crawled pages and known targets
//!
//! Pages are claimed in the page map before their fetch starts, so every
//! normalized path is fetched at most once no matter how often it is linked.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::future::BoxFuture;
use tracing::{debug, info, warn};
use url::Url;

use super::fetcher::{HttpPageFetcher, PageFetcher};
use super::known_targets::{TargetManifest, resolve_known_targets};
use super::normalize::{page_path, page_url, parse_host, split_fragment};
use super::options::{CrawlOptions, IgnoreRules};
use super::parse::{ContentKind, PageParser};
use super::queue::TaskQueue;
use super::server::DevServer;
use super::types::{CrawlResult, Issue, IssueKind, KnownTargets, Link, PageData};
use crate::Result;

/// Called with the number of pages crawled so far.
pub type ProgressCallback = Arc<dyn Fn(usize) + Send + Sync>;

enum PageEntry {
    /// Claimed; fetch in progress.
    Pending,
    Done(PageData),
}

#[derive(Default)]
struct CrawlState {
    pages: BTreeMap<String, PageEntry>,
    links: Vec<Link>,
    crawled: usize,
}

struct CrawlContext {
    fetcher: Arc<dyn PageFetcher>,
    parser: PageParser,
    host: Url,
    known: KnownTargets,
    options: CrawlOptions,
    queue: TaskQueue,
    state: Mutex<CrawlState>,
    progress: Option<ProgressCallback>,
}

impl CrawlContext {
    fn state(&self) -> MutexGuard<'_, CrawlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Crawls a site and reports broken links.
pub struct Crawler {
    options: CrawlOptions,
    fetcher: Arc<dyn PageFetcher>,
    progress: Option<ProgressCallback>,
}

impl Crawler {
    /// Crawler fetching pages over HTTP.
    pub fn new(options: CrawlOptions) -> Result<Self> {
        Ok(Self::with_fetcher(options, Arc::new(HttpPageFetcher::new()?)))
    }

    /// Crawler using a custom fetcher.
    #[must_use]
    pub fn with_fetcher(options: CrawlOptions, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            options,
            fetcher,
            progress: None,
        }
    }

    /// Report progress after every crawled page.
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Run the crawl.
    ///
    /// # Errors
    ///
    /// Fails on invalid options, a server that never comes up or a known
    /// target manifest that cannot be downloaded. Individual page failures
    /// are reported as issues instead.
    pub async fn run(&self) -> Result<CrawlResult> {
        let started = Instant::now();
        let rules = self.options.rules()?;
        let parser = PageParser::new(rules)?;
        let host = parse_host(&self.options.host)?;

        let server = match &self.options.start_command {
            Some(command) => Some(
                DevServer::start(command, &self.options.host, self.options.server_timeout())
                    .await?,
            ),
            None => None,
        };

        let crawled = self.crawl_site(parser, host).await;

        if let Some(server) = server {
            server.shutdown().await;
        }

        let result = crawled?;
        if let Some(out) = &self.options.out_path {
            TargetManifest::from_result(&result).write(out).await?;
        }

        info!(
            pages = result.pages.len(),
            links = result.links.len(),
            issues = result.issues.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "crawl finished"
        );
        Ok(result)
    }

    async fn crawl_site(&self, parser: PageParser, host: Url) -> Result<CrawlResult> {
        let client = reqwest::Client::new();
        let known = resolve_known_targets(
            &client,
            &self.options.known_targets,
            &self.options.known_targets_download_url,
        )
        .await?;
        debug!(pages = known.len(), "resolved known targets");

        let context = Arc::new(CrawlContext {
            fetcher: Arc::clone(&self.fetcher),
            parser,
            host,
            known,
            options: self.options.clone(),
            queue: TaskQueue::new(self.options.concurrency),
            state: Mutex::new(CrawlState::default()),
            progress: self.progress.clone(),
        });

        for seed in &self.options.seed_urls {
            enqueue(&context, Link::seed(seed.clone()));
        }
        context.queue.wait_all().await;

        let mut state = std::mem::take(&mut *context.state());
        state.links.sort();
        let pages: BTreeMap<String, PageData> = state
            .pages
            .into_iter()
            .filter_map(|(path, entry)| match entry {
                PageEntry::Done(page) => Some((path, page)),
                PageEntry::Pending => None,
            })
            .collect();
        let issues = check_links(&state.links, &pages, &context.known, context.parser.rules());

        Ok(CrawlResult {
            links: state.links,
            pages,
            issues,
        })
    }
}

/// Crawl with the default HTTP fetcher.
pub async fn crawl(options: CrawlOptions) -> Result<CrawlResult> {
    Crawler::new(options)?.run().await
}

/// Record `link` and schedule its page unless it is external, known or
/// already claimed.
fn enqueue(context: &Arc<CrawlContext>, link: Link) {
    let path = page_path(&link.href, context.parser.rules());
    let mut state = context.state();
    state.links.push(link);

    let Some(path) = path else {
        return;
    };
    if context.known.contains_key(&path) || state.pages.contains_key(&path) {
        return;
    }
    state.pages.insert(path.clone(), PageEntry::Pending);
    drop(state);

    context.queue.add(crawl_page(Arc::clone(context), path));
}

fn crawl_page(context: Arc<CrawlContext>, path: String) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        let (data, links) = fetch_page(&context, &path).await;

        let crawled = {
            let mut state = context.state();
            state.pages.insert(path.clone(), PageEntry::Done(data));
            state.crawled += 1;
            state.crawled
        };
        if let Some(progress) = &context.progress {
            progress(crawled);
        }

        for link in links {
            enqueue(&context, link);
        }
    })
}

async fn fetch_page(context: &CrawlContext, path: &str) -> (PageData, Vec<Link>) {
    let mut data = PageData {
        url: path.to_string(),
        status: 0,
        targets: BTreeSet::new(),
        content_type: None,
    };

    let url = match page_url(&context.host, path) {
        Ok(url) => url,
        Err(e) => {
            warn!(path, error = %e, "cannot build page URL");
            return (data, Vec::new());
        },
    };

    let started = Instant::now();
    let fetched = match context.fetcher.fetch(&url).await {
        Ok(fetched) => fetched,
        Err(e) => {
            warn!(%url, error = %e, "failed to fetch page");
            return (data, Vec::new());
        },
    };
    let elapsed = started.elapsed();
    if elapsed > context.options.slow_page() {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        warn!(%url, elapsed_ms, "slow page");
    } else {
        debug!(%url, status = fetched.status, "crawled page");
    }

    data.status = fetched.status;
    let kind = ContentKind::classify(fetched.content_type.as_deref());
    data.content_type = kind.media_type();

    match kind {
        ContentKind::Html => {
            let parsed = context.parser.parse(path, &fetched.body);
            data.targets = parsed.targets;
            (data, parsed.links)
        },
        ContentKind::Image => (data, Vec::new()),
        ContentKind::Other(media) => {
            warn!(%url, content_type = %media, "skipping non-HTML page");
            (data, Vec::new())
        },
        ContentKind::Invalid(header) => {
            warn!(%url, header = ?header, "invalid content-type, treating page as non-HTML");
            (data, Vec::new())
        },
    }
}

fn check_links(
    links: &[Link],
    pages: &BTreeMap<String, PageData>,
    known: &KnownTargets,
    rules: &IgnoreRules,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    for link in links {
        let Some(path) = page_path(&link.href, rules) else {
            continue;
        };
        let (_, fragment) = split_fragment(&link.href);

        let issue = if let Some(targets) = known.get(&path) {
            fragment.filter(|f| !targets.contains(*f)).map(|f| {
                (IssueKind::BrokenTarget, format!("Target \"{f}\" not found on known page"))
            })
        } else {
            match pages.get(&path) {
                Some(page) if page.is_ok() => fragment
                    .filter(|f| !page.targets.contains(*f))
                    .map(|f| (IssueKind::BrokenTarget, format!("Target \"{f}\" not found"))),
                Some(page) if page.status == 0 => {
                    Some((IssueKind::BrokenLink, "Page could not be fetched".to_string()))
                },
                Some(page) => Some((
                    IssueKind::BrokenLink,
                    format!("Page returned status {}", page.status),
                )),
                None => Some((IssueKind::BrokenLink, "Page was not crawled".to_string())),
            }
        };

        if let Some((kind, message)) = issue {
            issues.push(Issue {
                kind,
                link: link.clone(),
                message,
            });
        }
    }

    issues
}
