//! Package version lookup in a JavaScript monorepo.
//!
//! Versions label plan subsections (`@mui/x-data-grid-pro@8.1.0`). A missing
//! or broken `package.json` never fails a run; the package just renders
//! without a version.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use super::sections::VersionMap;

/// Directories scanned when none are configured.
pub const DEFAULT_PACKAGE_DIRS: [&str; 1] = ["packages"];

#[derive(Debug, Deserialize)]
struct PackageManifest {
    name: Option<String>,
    version: Option<String>,
}

/// Map package name → version for every `<root>/<dir>/*/package.json`.
pub async fn package_versions(root: &Path, package_dirs: &[String]) -> VersionMap {
    let mut versions = VersionMap::new();

    for dir in package_dirs {
        let dir = root.join(dir);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot read package directory");
                continue;
            },
        };

        let mut manifests: Vec<PathBuf> = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => manifests.push(entry.path().join("package.json")),
                Ok(None) => break,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "stopped listing package directory");
                    break;
                },
            }
        }
        manifests.sort();

        for manifest in manifests {
            if let Some((name, version)) = read_manifest(&manifest).await {
                debug!(%name, %version, "found workspace package");
                versions.insert(name, version);
            }
        }
    }

    versions
}

async fn read_manifest(path: &Path) -> Option<(String, String)> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read package.json");
            return None;
        },
    };
    match serde_json::from_str::<PackageManifest>(&content) {
        Ok(PackageManifest {
            name: Some(name),
            version: Some(version),
        }) => Some((name, version)),
        Ok(_) => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "malformed package.json");
            None
        },
    }
}
