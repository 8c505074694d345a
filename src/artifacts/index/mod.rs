//! Staging index file format
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "TIDX" (4 bytes)
//!   - Version: 1 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length, sorted by path):
//!   - Object ID (20 bytes, zeroed for a staged removal)
//!   - Flags (2 bytes): removal bit + path length
//!   - Path, NUL terminated, padded to 8-byte alignment
//!
//! Checksum (20 bytes):
//!   - SHA-1 hash of all preceding bytes
//! ```

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

/// Size of SHA-1 checksum in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 12; // 4 bytes for marker, 4 for version, 4 for entries_count

/// Magic signature identifying index files
pub const SIGNATURE: &str = "TIDX";

/// Index file format version
pub const VERSION: u32 = 1;
