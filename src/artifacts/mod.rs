//! Value types and algorithms
//!
//! - `branch`: Branch name validation
//! - `checkout`: Planning the working directory rewrite of a checkout
//! - `core`: Shared utilities (pager wrapper)
//! - `index`: Staging index file format and path normalization
//! - `log`: Commit history traversal
//! - `objects`: Object types (blob, tree, commit)
//! - `status`: Working tree status inspection

pub mod branch;
pub mod checkout;
pub mod core;
pub mod index;
pub mod log;
pub mod objects;
pub mod status;
