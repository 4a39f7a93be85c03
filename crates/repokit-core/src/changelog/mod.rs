//! Release notes from merged pull requests.
//!
//! The pipeline runs in fixed stages:
//!
//! 1. [`filter`] drops excluded commits.
//! 2. [`labels`] parses scope, component, plan and flag labels.
//! 3. [`categorize`] assigns category keys per the configured strategy.
//! 4. [`sections`] groups categories into sections and orders them.
//! 5. [`render`] writes markdown.
//!
//! [`pipeline::generate`] runs all of them. Commits come from a
//! [`github::CommitSource`].

pub mod categorize;
pub mod config;
pub mod contributors;
pub mod filter;
pub mod github;
pub mod labels;
pub mod pipeline;
pub mod render;
pub mod sections;
pub mod types;
pub mod workspace;

pub use config::{ChangelogConfig, Strategy};
pub use github::{CommitRange, CommitSource, GitHubCommitSource, JsonCommitSource};
pub use pipeline::{ChangelogOutput, generate};
pub use render::RenderOptions;
pub use sections::VersionMap;
pub use types::{ChangelogSection, Commit, Contributors};
