//! Staging index
//!
//! The index records what the next commit will change relative to HEAD's tree: each
//! entry maps a path to a staged blob or to a staged removal. The next snapshot is
//! HEAD's flattened tree with every entry laid over it (see [`Index::overlay`]).
//!
//! ## Data Structures
//!
//! - `entries`: Maps file paths to their index entries
//! - `children`: Maps directory paths to the entries beneath them, used to evict
//!   entries when a file replaces a directory or vice versa

use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{ENTRY_BLOCK, ENTRY_MIN_SIZE, IndexEntry};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::HEADER_SIZE;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::TwigError;
use anyhow::Context;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

/// Suffix of the file the index is written to before being renamed into place
const LOCK_SUFFIX: &str = "lock";

#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (`.twig/index`)
    path: Box<Path>,
    entries: BTreeMap<PathBuf, IndexEntry>,
    children: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    header: IndexHeader,
    /// Whether the index has been modified since loading
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
            header: IndexHeader::empty(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    fn reset(&mut self) {
        self.entries.clear();
        self.children.clear();
        self.header = IndexHeader::empty();
        self.changed = false;
    }

    /// Load the index from disk
    ///
    /// A missing or empty file is an empty index. Anything that fails to parse, or
    /// whose trailing checksum does not match, is reported as `CorruptIndex`.
    ///
    /// # Locking
    ///
    /// Acquires a shared lock on the index file during reading.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        self.reset();

        let mut index_file = match std::fs::OpenOptions::new().read(true).open(self.path()) {
            Ok(file) => file,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("Unable to open index {}", self.path.display()));
            }
        };
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;

        if lock.deref_mut().metadata()?.len() == 0 {
            return Ok(());
        }

        let mut reader = Checksum::new(lock);
        let parsed = self
            .parse_header(&mut reader)
            .and_then(|entries_count| self.parse_entries(entries_count, &mut reader))
            .and_then(|_| reader.verify());

        if let Err(error) = parsed {
            self.reset();
            return Err(TwigError::CorruptIndex(format!("{error:#}")).into());
        }

        tracing::trace!(entries = self.entries.len(), "index loaded");

        Ok(())
    }

    fn parse_header(&self, reader: &mut Checksum) -> anyhow::Result<u32> {
        let header_bytes = reader.read(HEADER_SIZE)?;
        let header = IndexHeader::deserialize(std::io::Cursor::new(header_bytes))?;
        header.validate()?;

        Ok(header.entries_count)
    }

    /// Parse all entries, each padded to 8-byte alignment
    fn parse_entries(&mut self, entries_count: u32, reader: &mut Checksum) -> anyhow::Result<()> {
        for _ in 0..entries_count {
            let mut entry_bytes = reader.read(ENTRY_MIN_SIZE)?.to_vec();

            while entry_bytes.last() != Some(&0) {
                entry_bytes.extend_from_slice(&reader.read(ENTRY_BLOCK)?);
            }

            let entry = IndexEntry::deserialize(std::io::Cursor::new(entry_bytes))?;
            self.store_entry(entry);
        }

        self.header.entries_count = entries_count;

        Ok(())
    }

    /// Stage a blob for a path
    pub fn add(&mut self, name: PathBuf, oid: ObjectId) {
        self.insert(IndexEntry::new(name, Some(oid)));
    }

    /// Stage the removal of a tracked path
    pub fn add_removal(&mut self, name: PathBuf) {
        self.insert(IndexEntry::removal(name));
    }

    fn insert(&mut self, entry: IndexEntry) {
        self.discard_conflicts(&entry);
        self.store_entry(entry);

        self.header.entries_count = self.entries.len() as u32;
        self.changed = true;
    }

    /// Drop whatever is staged for a path and beneath it
    pub fn remove(&mut self, path: &Path) {
        self.remove_entry(path);
        self.remove_children(path);

        self.header.entries_count = self.entries.len() as u32;
        self.changed = true;
    }

    /// Empty the index, as done after a successful commit
    pub fn clear_entries(&mut self) {
        if self.entries.is_empty() {
            return;
        }

        self.entries.clear();
        self.children.clear();
        self.header.entries_count = 0;
        self.changed = true;
    }

    /// Remove entries that a new entry would shadow: files standing where one of its
    /// parent directories goes, and anything staged beneath it
    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        for parent in entry.parent_dirs() {
            self.remove_entry(parent);
        }
        self.remove_children(&entry.name);
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.children
                .entry(parent.to_path_buf())
                .or_default()
                .insert(entry.name.clone());
        }

        self.entries.insert(entry.name.clone(), entry);
    }

    fn remove_children(&mut self, path: &Path) {
        if let Some(children) = self.children.remove(path) {
            for child in children {
                self.remove_entry(&child);
            }
        }
    }

    fn remove_entry(&mut self, path: &Path) {
        if let Some(entry) = self.entries.remove(path) {
            for parent in entry.parent_dirs() {
                if let Some(children) = self.children.get_mut(parent) {
                    children.remove(path);
                    if children.is_empty() {
                        self.children.remove(parent);
                    }
                }
            }
        }
    }

    /// Lay the staged entries over a base snapshot (HEAD's flattened tree)
    ///
    /// A staged file replaces any base file standing where one of its parent
    /// directories goes, and any base files beneath its own path. A staged removal
    /// drops the path.
    pub fn overlay(&self, mut base: BTreeMap<PathBuf, ObjectId>) -> BTreeMap<PathBuf, ObjectId> {
        for entry in self.entries.values() {
            match &entry.oid {
                Some(oid) => {
                    for parent in entry.parent_dirs() {
                        base.remove(parent);
                    }
                    base.retain(|path, _| !path.starts_with(&entry.name));
                    base.insert(entry.name.clone(), oid.clone());
                }
                None => {
                    base.remove(&entry.name);
                }
            }
        }

        base
    }

    /// Persist the index
    ///
    /// The content is written to `index.lock` under an exclusive lock and renamed over
    /// the index, so readers never see a half-written file.
    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        let lock_path = self.path.with_extension(LOCK_SUFFIX);
        let mut index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("Unable to open {}", lock_path.display()))?;

        {
            let lock = file_guard::lock(&mut index_file, file_guard::Lock::Exclusive, 0, 1)?;
            let mut writer = Checksum::new(lock);

            self.header = IndexHeader {
                entries_count: self.entries.len() as u32,
                ..self.header.clone()
            };
            writer.write(&self.header.serialize()?)?;

            for entry in self.entries.values() {
                writer.write(&entry.serialize()?)?;
            }

            writer.write_checksum()?;
        }

        std::fs::rename(&lock_path, self.path()).with_context(|| {
            format!("Unable to move {} into place", lock_path.display())
        })?;
        self.changed = false;

        tracing::debug!(entries = self.entries.len(), "index written");

        Ok(())
    }
}
