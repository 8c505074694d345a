//! twig: a minimal version control storage engine
//!
//! A content-addressable object store (blobs, trees, commits) layered with a
//! staging index, branch references and the logic that reconciles a live
//! working directory against them.
//!
//! - `areas`: stateful on-disk components owned by a [`areas::repository::Repository`]
//! - `artifacts`: object model and algorithms (tree building, status, checkout, log)
//! - `commands`: user-facing operations rendering their results
//! - `config`, `errors`, `observability`: configuration, error kinds and logging

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod config;
pub mod errors;
pub mod observability;

/// Name of the directory holding the repository metadata
pub const METADATA_DIR: &str = ".twig";

/// Output format used when rendering commits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CommitDisplayFormat {
    #[default]
    Medium,
    OneLine,
}
