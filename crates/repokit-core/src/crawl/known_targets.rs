//! Known target manifests.
//!
//! A manifest lists the `#id` targets of pages that are not crawled, usually
//! pages of a sibling site:
//!
//! ```json
//! { "targets": { "/x/react-data-grid": ["#main-content", "#usage"] } }
//! ```
//!
//! The crawler writes the same format for the pages it crawls, so one site's
//! output can feed another site's check.

use std::path::Path;

use futures::future::try_join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::normalize::canonical_path;
use super::types::{CrawlResult, KnownTargets};
use crate::{Error, Result};

/// On-disk and downloadable target manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetManifest {
    /// Page path → targets.
    pub targets: KnownTargets,
}

impl TargetManifest {
    /// Targets of every successfully crawled HTML page.
    #[must_use]
    pub fn from_result(result: &CrawlResult) -> Self {
        let targets = result
            .pages
            .values()
            .filter(|page| page.is_ok() && page.content_type.as_deref() == Some("text/html"))
            .map(|page| (page.url.clone(), page.targets.clone()))
            .collect();
        Self { targets }
    }

    /// Write the manifest as pretty JSON.
    pub async fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, json).await?;
        info!(path = %path.display(), pages = self.targets.len(), "wrote target manifest");
        Ok(())
    }
}

async fn download(client: &Client, url: &str) -> Result<TargetManifest> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let manifest: TargetManifest = serde_json::from_str(&body)
        .map_err(|e| Error::Parse(format!("Invalid target manifest at '{url}': {e}")))?;
    debug!(url, pages = manifest.targets.len(), "downloaded target manifest");
    Ok(manifest)
}

/// Download `urls` in parallel and overlay `user` on top.
///
/// Page keys are normalized like crawled paths, so `/x/grid/` and `/x/grid`
/// name the same page. Downloaded manifests are merged per page; a page
/// listed in `user` replaces whatever the downloads said about it.
pub async fn resolve_known_targets(
    client: &Client,
    user: &KnownTargets,
    urls: &[String],
) -> Result<KnownTargets> {
    let manifests = try_join_all(urls.iter().map(|url| download(client, url))).await?;

    let mut known = KnownTargets::new();
    for manifest in manifests {
        merge(&mut known, manifest.targets);
    }
    let mut overrides = KnownTargets::new();
    merge(&mut overrides, user.clone());
    known.extend(overrides);
    Ok(known)
}

fn merge(into: &mut KnownTargets, targets: KnownTargets) {
    for (page, ids) in targets {
        let page = canonical_path(&page).unwrap_or(page);
        into.entry(page).or_default().extend(ids);
    }
}
