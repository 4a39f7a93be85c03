//! Configuration file loading.
//!
//! Both tools read their settings from a single file in one of two formats:
//!
//! | Extension | Format |
//! |-----------|--------|
//! | `.toml`   | TOML   |
//! | `.json`   | JSON   |
//!
//! Keys are camelCase in both formats so a file can be converted between the
//! two without renaming anything. Any other extension is rejected before the
//! file is read.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use repokit_core::changelog::ChangelogConfig;
//! use std::path::Path;
//!
//! let config = ChangelogConfig::load(Path::new("changelog.config.toml"))?;
//! println!("strategy: {:?}", config.categorization.strategy);
//! # Ok::<(), repokit_core::Error>(())
//! ```

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{Error, Result};

/// File formats accepted for configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML document.
    Toml,
    /// JSON document.
    Json,
}

impl ConfigFormat {
    /// Extensions accepted by [`ConfigFormat::from_path`].
    pub const EXTENSIONS: [&'static str; 2] = ["toml", "json"];

    /// Determine the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the extension is missing or not one of
    /// [`ConfigFormat::EXTENSIONS`].
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(Error::Config(format!(
                "Unsupported config file '{}': expected one of .{}",
                path.display(),
                Self::EXTENSIONS.join(", .")
            ))),
        }
    }

    /// Deserialize `content` in this format.
    pub fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T> {
        match self {
            Self::Toml => toml::from_str(content)
                .map_err(|e| Error::Config(format!("Failed to parse TOML config: {e}"))),
            Self::Json => serde_json::from_str(content)
                .map_err(|e| Error::Config(format!("Failed to parse JSON config: {e}"))),
        }
    }
}

/// Read and deserialize a configuration file, choosing the parser by extension.
///
/// # Errors
///
/// - [`Error::Config`] for an unsupported extension or malformed content
/// - [`Error::NotFound`] when the file does not exist
/// - [`Error::Io`] when the file exists but cannot be read
pub fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(format!("Config file '{}' does not exist", path.display()))
        } else {
            Error::Io(e)
        }
    })?;
    debug!(path = %path.display(), ?format, "loading config file");
    format.parse(&content)
}
