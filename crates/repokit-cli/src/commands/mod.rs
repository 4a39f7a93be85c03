//! Command implementations.

pub mod changelog;
pub mod check_links;
