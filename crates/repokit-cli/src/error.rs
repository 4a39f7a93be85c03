//! CLI error handling with semantic exit codes.
//!
//! Errors are categorized so scripts and CI jobs can tell a broken link report
//! apart from a misconfigured run.
//!
//! # Exit Code Categories
//!
//! | Code | Category | Description |
//! |------|----------|-------------|
//! | 0 | Success | Command completed successfully |
//! | 1 | `Internal` | Unexpected/internal error |
//! | 2 | `Usage` | Invalid arguments or configuration |
//! | 3 | `NotFound` | Config, commit file or ref not found |
//! | 5 | `Network` | Network or fetch failure |
//! | 6 | `Timeout` | Operation timed out |
//! | 8 | `BrokenLinks` | The link check found issues |
//!
//! ```bash
//! repokit check-links --host http://localhost:3000
//! case $? in
//!     0) echo "All links valid" ;;
//!     8) echo "Broken links found" ;;
//!     *) echo "Check failed" ;;
//! esac
//! ```

use std::fmt;

use repokit_core::Error as CoreError;

/// Semantic error category determining the exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Unexpected or internal error (exit code 1).
    Internal = 1,

    /// Invalid arguments or configuration (exit code 2).
    ///
    /// Covers configuration files that do not validate, including missing
    /// package mappings and patterns that do not compile.
    Usage = 2,

    /// Requested resource not found (exit code 3).
    NotFound = 3,

    /// Network or fetch failure (exit code 5).
    Network = 5,

    /// Operation timed out (exit code 6).
    ///
    /// Includes a dev server that never became reachable.
    Timeout = 6,

    /// The link check completed and found issues (exit code 8).
    BrokenLinks = 8,
}

impl ErrorCategory {
    /// Get the exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        self as u8
    }

    /// Get a short description of this error category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::Usage => "usage error",
            Self::NotFound => "not found",
            Self::Network => "network error",
            Self::Timeout => "timeout",
            Self::BrokenLinks => "broken links",
        }
    }

    /// Category of a core library error.
    #[must_use]
    pub fn from_core(err: &CoreError) -> Self {
        match err {
            CoreError::Config(_)
            | CoreError::MissingMapping { .. }
            | CoreError::InvalidPattern { .. }
            | CoreError::Parse(_)
            | CoreError::Serialization(_) => Self::Usage,
            CoreError::NotFound(_) => Self::NotFound,
            CoreError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => Self::NotFound,
            CoreError::Network(e) if e.is_timeout() => Self::Timeout,
            CoreError::Network(_) => Self::Network,
            CoreError::ServerStart { .. } => Self::Timeout,
            CoreError::Io(_) | CoreError::Other(_) => Self::Internal,
        }
    }

    /// Infer the error category from an error message.
    ///
    /// Fallback for errors that are neither a [`CliError`] nor a core error.
    #[must_use]
    pub fn infer_from_message(msg: &str) -> Self {
        let msg_lower = msg.to_lowercase();

        // Timeout errors (check before Network so "connection timeout" is categorized correctly)
        if msg_lower.contains("timeout") || msg_lower.contains("timed out") {
            return Self::Timeout;
        }

        if msg_lower.contains("network")
            || msg_lower.contains("connection")
            || msg_lower.contains("dns")
            || msg_lower.contains("http")
            || msg_lower.contains("unreachable")
        {
            return Self::Network;
        }

        if msg_lower.contains("not found")
            || msg_lower.contains("no such")
            || msg_lower.contains("does not exist")
        {
            return Self::NotFound;
        }

        if msg_lower.contains("invalid argument")
            || msg_lower.contains("missing required")
            || msg_lower.contains("invalid value")
        {
            return Self::Usage;
        }

        Self::Internal
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A CLI error with a semantic category for exit code mapping.
///
/// Wraps an `anyhow::Error` so the full context chain is kept.
#[derive(Debug)]
pub struct CliError {
    /// The semantic category of this error.
    pub category: ErrorCategory,
    /// The underlying error with full context.
    pub source: anyhow::Error,
}

impl CliError {
    /// Create a new CLI error with explicit category.
    pub fn new(category: ErrorCategory, source: impl Into<anyhow::Error>) -> Self {
        Self {
            category,
            source: source.into(),
        }
    }

    /// Create a usage error.
    pub fn usage(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Usage, source)
    }

    /// Create a broken links error.
    pub fn broken_links(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::BrokenLinks, source)
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.category.exit_code()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Determine the exit code from an `anyhow::Error`.
///
/// A [`CliError`] anywhere in the chain decides first, then a core library
/// error, then the message heuristics.
#[must_use]
pub fn exit_code_from_error(err: &anyhow::Error) -> u8 {
    if let Some(cli_err) = err.chain().find_map(|e| e.downcast_ref::<CliError>()) {
        return cli_err.exit_code();
    }
    if let Some(core_err) = err.chain().find_map(|e| e.downcast_ref::<CoreError>()) {
        return ErrorCategory::from_core(core_err).exit_code();
    }
    ErrorCategory::infer_from_message(&err.to_string()).exit_code()
}
