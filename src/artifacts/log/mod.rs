//! Commit history traversal
//!
//! - `rev_list`: lazy walk from a branch tip along first parents

pub mod rev_list;
