//! Error types and handling for repokit-core operations.
//!
//! Every fallible function in this crate returns [`Result<T>`]. Errors are
//! split into families so callers can decide how to react:
//!
//! - **Configuration errors** ([`Error::Config`], [`Error::MissingMapping`],
//!   [`Error::InvalidPattern`]) are programmer/config mistakes. They abort a
//!   changelog run immediately and are never retried.
//! - **Network errors** ([`Error::Network`], [`Error::ServerStart`]) come from
//!   the GitHub API, known-target downloads or the dev server health check.
//! - **Data errors** ([`Error::Parse`], [`Error::Serialization`]) come from
//!   malformed inputs such as commit files or target manifests.
//!
//! ```rust
//! use repokit_core::Error;
//!
//! let err = Error::MissingMapping {
//!     kind: repokit_core::error::MappingKind::Scope,
//!     name: "unknown-package".to_string(),
//!     pr: 42,
//! };
//! assert_eq!(
//!     err.to_string(),
//!     r#"No package mapping found for scope "unknown-package" in commit #42"#
//! );
//! assert_eq!(err.category(), "config");
//! ```

use std::fmt;

use thiserror::Error;

/// What kind of lookup failed when resolving a package category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingKind {
    /// A `scope:` label had no entry in the package mappings table.
    Scope,
    /// A plan was present but the resolved base package has no variant for it.
    Plan(String),
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scope => f.write_str("scope"),
            Self::Plan(plan) => write!(f, "{plan} plan"),
        }
    }
}

/// The main error type for repokit-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed (config files, commit files, manifests).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed.
    ///
    /// The underlying `reqwest::Error` is preserved so connection and timeout
    /// failures can be told apart from protocol errors.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Input could not be parsed (commit records, target manifests, headers).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration is invalid, incomplete or uses an unsupported format.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A commit references a scope or plan with no configured package mapping.
    ///
    /// Raised by the package categorization strategy. This always aborts the
    /// whole run: the mapping table must be fixed before a changelog can be
    /// produced.
    #[error("{}", missing_mapping_message(.kind, .name, .pr))]
    MissingMapping {
        /// Which table was consulted.
        kind: MappingKind,
        /// The scope (for [`MappingKind::Scope`]) or base package name.
        name: String,
        /// Pull request number of the offending commit.
        pr: u64,
    },

    /// A configured regular expression failed to compile.
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern as written in the configuration.
        pattern: String,
        /// Compiler error message.
        reason: String,
    },

    /// The development server never became reachable.
    ///
    /// The last polling failure is kept as the error source.
    #[error("Server at {host} did not respond within {timeout_secs}s")]
    ServerStart {
        /// Host that was polled.
        host: String,
        /// How long polling lasted before giving up.
        timeout_secs: u64,
        /// Last failure observed while polling.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Requested resource was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn missing_mapping_message(kind: &MappingKind, name: &str, pr: &u64) -> String {
    match kind {
        MappingKind::Scope => {
            format!("No package mapping found for scope \"{name}\" in commit #{pr}")
        },
        MappingKind::Plan(plan) => {
            format!("No {plan} plan mapping found for package \"{name}\" in commit #{pr}")
        },
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// Connection failures and timeouts are transient; configuration and
    /// parse errors are permanent.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::ServerStart { .. } => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::Config(_) | Self::MissingMapping { .. } | Self::InvalidPattern { .. } => {
                "config"
            },
            Self::ServerStart { .. } => "server",
            Self::Serialization(_) => "serialization",
            Self::NotFound(_) => "not_found",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
