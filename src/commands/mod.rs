//! User-facing commands
//!
//! - `porcelain`: one module per command (init, add, commit, status, log, branch,
//!   checkout), each extending [`crate::areas::repository::Repository`] with the core
//!   operation and the rendering of its result.

pub mod porcelain;
