//! Page fetching.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use crate::{Error, Result};

/// Raw response of a page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header as sent, lossily decoded.
    pub content_type: Option<String>,
    /// Response body.
    pub body: String,
}

/// Retrieves pages for the crawler.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`. Error statuses are returned, not raised.
    async fn fetch(&self, url: &Url) -> Result<FetchedPage>;
}

/// [`PageFetcher`] over HTTP.
///
/// Requests carry no timeout of their own.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    /// Create a fetcher with a fresh HTTP client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("repokit-link-check/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
        let body = response.text().await?;
        debug!(%url, status, bytes = body.len(), "fetched page");
        Ok(FetchedPage {
            status,
            content_type,
            body,
        })
    }
}
