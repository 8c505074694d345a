//! Working tree status inspection
//!
//! Every path known to HEAD's tree, the staged snapshot or the working directory is
//! put in exactly one category, comparing content digests only.
//!
//! ## Components
//!
//! - `file_change`: the categories and how they are rendered
//! - `inspector`: classification of a single path
//! - `status_info`: the full report for a repository

pub mod file_change;
pub mod inspector;
pub mod status_info;
