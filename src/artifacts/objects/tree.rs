//! Directory snapshots
//!
//! A tree payload is a run of `<mode> <name>\0<20 raw digest bytes>` entries, mode
//! `100644` for files and `40000` for subtrees. Entries are ordered by name with
//! directory names compared as if they ended in `/`, so the same snapshot always
//! hashes to the same tree whatever order its paths were staged in.

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::{normalize_path, parent_dirs};
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::TwigError;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// A tree entry as read back from the object store
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct StoredEntry {
    pub oid: ObjectId,
    pub mode: EntryMode,
}

/// Entry of a tree under construction
#[derive(Debug, Clone)]
enum TreeEntry {
    /// File entry (blob)
    File(ObjectId),
    /// Directory entry (nested tree)
    Directory(Tree),
}

impl TreeEntry {
    fn mode(&self) -> EntryMode {
        match self {
            TreeEntry::File(_) => EntryMode::File,
            TreeEntry::Directory(_) => EntryMode::Directory,
        }
    }

    fn oid(&self) -> anyhow::Result<ObjectId> {
        match self {
            TreeEntry::File(oid) => Ok(oid.clone()),
            TreeEntry::Directory(tree) => tree.object_id(),
        }
    }
}

/// A directory snapshot, either parsed from the store or built from staged paths
///
/// Built entries are keyed by their sort name: directories carry a trailing `/`.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    readable_entries: BTreeMap<String, StoredEntry>,
    writeable_entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// Build a tree from a flat snapshot of `path -> blob` pairs
    ///
    /// Paths are normalized first. Two paths that collide after normalization, or a
    /// path used both as a file and as a directory, fail with `PathConflict`.
    pub fn build(
        entries: impl IntoIterator<Item = (PathBuf, ObjectId)>,
    ) -> anyhow::Result<Self> {
        let mut root = Self::default();

        for (path, oid) in entries {
            let name = normalize_path(&path)?;
            if name.as_os_str().is_empty() {
                anyhow::bail!("Cannot add an empty path to a tree: {}", path.display());
            }

            let parents = parent_dirs(&name);
            root.add_entry(&parents, &name, oid)?;
        }

        Ok(root)
    }

    /// Traverse the tree depth-first, calling a function on each node
    ///
    /// Visits children before parents (post-order traversal), which is
    /// necessary for storing trees since child OIDs must be known before
    /// storing the parent.
    pub fn traverse<F>(&self, func: &F) -> anyhow::Result<()>
    where
        F: Fn(&Tree) -> anyhow::Result<()>,
    {
        for entry in self.writeable_entries.values() {
            if let TreeEntry::Directory(tree) = entry {
                tree.traverse(func)?;
            }
        }
        func(self)?;

        Ok(())
    }

    /// Add an entry to the tree at the appropriate location
    ///
    /// Creates intermediate directory entries as needed.
    fn add_entry(&mut self, parents: &[&Path], name: &Path, oid: ObjectId) -> anyhow::Result<()> {
        match parents.split_first() {
            None => {
                let basename = name
                    .file_name()
                    .and_then(|s| s.to_str())
                    .context("Invalid file name")?;

                if self.writeable_entries.contains_key(&format!("{basename}/"))
                    || self.writeable_entries.contains_key(basename)
                {
                    return Err(TwigError::PathConflict(name.to_path_buf()).into());
                }

                self.writeable_entries
                    .insert(basename.to_string(), TreeEntry::File(oid));
            }
            Some((parent, rest)) => {
                let dirname = parent
                    .file_name()
                    .and_then(|s| s.to_str())
                    .context("Invalid parent")?;

                if self.writeable_entries.contains_key(dirname) {
                    return Err(TwigError::PathConflict(parent.to_path_buf()).into());
                }

                let tree = match self
                    .writeable_entries
                    .entry(format!("{dirname}/"))
                    .or_insert_with(|| TreeEntry::Directory(Tree::default()))
                {
                    TreeEntry::Directory(tree) => tree,
                    TreeEntry::File(_) => {
                        return Err(TwigError::PathConflict(parent.to_path_buf()).into());
                    }
                };
                tree.add_entry(rest, name, oid)?;
            }
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.readable_entries.is_empty() && self.writeable_entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &StoredEntry)> {
        self.readable_entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, StoredEntry)> {
        self.readable_entries.into_iter()
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content = Vec::new();

        for (name, tree_entry) in &self.writeable_entries {
            // Directory keys only carry the trailing '/' for ordering
            let name = name.trim_end_matches('/');

            let header = format!("{:o} {}", tree_entry.mode().as_u32(), name);
            content.write_all(header.as_bytes())?;
            content.push(0);
            tree_entry.oid()?.write_h40_to(&mut content)?;
        }

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Tree {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;

        let mut entries = BTreeMap::new();
        let mut rest = payload.as_slice();

        while !rest.is_empty() {
            let (mode, tail) = split_at_byte(rest, b' ').context("tree entry without a mode")?;
            let mode = EntryMode::from_octal_str(std::str::from_utf8(mode)?)?;

            let (name, tail) = split_at_byte(tail, 0).context("tree entry without a name")?;
            let name = std::str::from_utf8(name)?.to_string();
            if name.is_empty() || name.contains('/') {
                anyhow::bail!("invalid entry name '{name}'");
            }

            let (raw_oid, tail) = tail
                .split_first_chunk::<{ OBJECT_ID_LENGTH / 2 }>()
                .context("tree entry with a truncated object id")?;

            entries.insert(name, StoredEntry::new(ObjectId::from_raw(raw_oid), mode));
            rest = tail;
        }

        Ok(Tree {
            readable_entries: entries,
            writeable_entries: BTreeMap::new(),
        })
    }
}

/// Split around the first `delimiter`, dropping it
fn split_at_byte(bytes: &[u8], delimiter: u8) -> Option<(&[u8], &[u8])> {
    let position = bytes.iter().position(|byte| *byte == delimiter)?;

    Some((&bytes[..position], &bytes[position + 1..]))
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }
}
