//! Stateful repository components
//!
//! - `database`: Object store for blobs, trees, and commits
//! - `index`: Staging index for the next commit
//! - `refs`: Branches and HEAD
//! - `repository`: Handle owning all of the above
//! - `workspace`: Working directory file system operations

pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
