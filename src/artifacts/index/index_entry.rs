//! Index entry representation
//!
//! Each entry maps a normalized relative path to the blob staged for it, or to
//! nothing when the entry records a staged removal.
//!
//! ## Entry Format
//!
//! `<20-byte oid><u16 flags><path>\0` padded with NUL bytes to an 8-byte boundary.
//! The high bit of the flags marks a removal, the low 12 bits hold the path length.

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::TwigError;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::cmp::min;
use std::io::{BufRead, Write};
use std::path::{Component, Path, PathBuf};

/// Maximum path length representable in the flags
const MAX_PATH_SIZE: usize = 0x0fff;

/// Flag marking a staged removal
const REMOVAL_FLAG: u16 = 0x8000;

/// Block size for entry alignment (8 bytes)
pub const ENTRY_BLOCK: usize = 8;

/// Minimum size of an index entry in bytes
pub const ENTRY_MIN_SIZE: usize = 24;

/// Index entry for a single staged path
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// Normalized path relative to repository root
    pub name: PathBuf,
    /// Staged blob, `None` for a staged removal
    pub oid: Option<ObjectId>,
}

impl IndexEntry {
    pub fn removal(name: PathBuf) -> Self {
        IndexEntry { name, oid: None }
    }

    pub fn is_removal(&self) -> bool {
        self.oid.is_none()
    }

    /// Ancestor directories of the entry, outermost first
    pub fn parent_dirs(&self) -> Vec<&Path> {
        parent_dirs(&self.name)
    }
}

/// Ancestor directories of a relative path, outermost first
pub fn parent_dirs(path: &Path) -> Vec<&Path> {
    let mut dirs = path
        .ancestors()
        .skip(1)
        .filter(|dir| !dir.as_os_str().is_empty())
        .collect::<Vec<_>>();
    dirs.reverse();

    dirs
}

/// Lexically normalize a path relative to the repository root
///
/// Drops `.` components and resolves `..` against preceding components. An absolute
/// path or one that climbs above the root fails with `PathOutsideRepository`.
pub fn normalize_path(path: &Path) -> anyhow::Result<PathBuf> {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => normalized.push(part),
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(TwigError::PathOutsideRepository(path.to_path_buf()).into());
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(TwigError::PathOutsideRepository(path.to_path_buf()).into());
            }
        }
    }

    if normalized.to_str().is_none() {
        anyhow::bail!("Path is not valid UTF-8: {}", path.display());
    }

    Ok(normalized)
}

impl PartialOrd for IndexEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl Packable for IndexEntry {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let entry_name = self
            .name
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid entry name"))?;

        let mut flags = min(entry_name.len(), MAX_PATH_SIZE) as u16;
        let mut entry_bytes = Vec::with_capacity(ENTRY_MIN_SIZE + entry_name.len());

        match &self.oid {
            Some(oid) => oid.write_h40_to(&mut entry_bytes)?,
            None => {
                entry_bytes.write_all(&[0u8; OBJECT_ID_LENGTH / 2])?;
                flags |= REMOVAL_FLAG;
            }
        }
        entry_bytes.write_u16::<byteorder::NetworkEndian>(flags)?;
        entry_bytes.write_all(entry_name.as_bytes())?;

        // There must be at least one null byte at the end
        entry_bytes.push(0);
        while entry_bytes.len() % ENTRY_BLOCK != 0 {
            entry_bytes.push(0);
        }

        Ok(Bytes::from(entry_bytes))
    }
}

impl Unpackable for IndexEntry {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let bytes = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;

        if bytes.len() < ENTRY_MIN_SIZE {
            return Err(anyhow::anyhow!("Invalid index entry size"));
        }

        let mut oid_bytes = std::io::Cursor::new(&bytes[0..20]);
        let oid = ObjectId::read_h40_from(&mut oid_bytes)?;
        let flags = byteorder::NetworkEndian::read_u16(&bytes[20..22]);

        // Extract the entry name, which is null-terminated
        let name_end = bytes[22..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| anyhow::anyhow!("Missing null terminator in entry name"))?;
        let name = std::str::from_utf8(&bytes[22..22 + name_end])
            .map_err(|_| anyhow::anyhow!("Invalid UTF-8 in entry name"))?;

        if name.is_empty() {
            return Err(anyhow::anyhow!("Empty entry name"));
        }

        let oid = match flags & REMOVAL_FLAG {
            0 => Some(oid),
            _ => None,
        };

        Ok(IndexEntry {
            name: PathBuf::from(name),
            oid,
        })
    }
}
