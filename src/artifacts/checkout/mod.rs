//! Checkout planning
//!
//! Switching branches rewrites the working directory into the target commit's tree:
//! the plan is computed from the current and target snapshots and the files on disk,
//! then applied by the workspace.

pub mod migration;
