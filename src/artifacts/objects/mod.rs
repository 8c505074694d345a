//! Object model
//!
//! Every piece of content is an immutable object identified by the SHA-1 digest of
//! its canonical bytes. There are three kinds:
//!
//! - **Blob**: raw file content
//! - **Tree**: directory listing (names, modes and object IDs)
//! - **Commit**: snapshot metadata (tree, parents, author, message)
//!
//! All objects share the canonical form `<type> <size>\0<payload>`.

pub mod blob;
pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;
