//! Object store
//!
//! Objects live under `.twig/objects/<2 hex>/<38 hex>`, zlib-compressed. They are written
//! once through a temp file and a rename and never touched again.

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::errors::TwigError;
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, object_id: &ObjectId) -> bool {
        self.path.join(object_id.to_path()).is_file()
    }

    /// Persist an object under its digest and return that digest
    ///
    /// Storing identical content twice is a no-op returning the same digest.
    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        let canonical = object.encode()?;
        let object_id = ObjectId::digest(&canonical);

        if self.contains(&object_id) {
            tracing::trace!(oid = %object_id, "object already stored");
            return Ok(object_id);
        }

        self.write_compressed(&object_id, &canonical)?;
        tracing::debug!(oid = %object_id, kind = %object.object_type(), "stored object");

        Ok(object_id)
    }

    /// Store a freshly built tree and every subtree beneath it
    pub fn store_tree(&self, tree: &Tree) -> anyhow::Result<ObjectId> {
        tree.traverse(&|subtree| self.store(subtree).map(|_| ()))?;

        tree.object_id()
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> anyhow::Result<ObjectBox> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        let parsed = match object_type {
            ObjectType::Blob => {
                Blob::deserialize(object_reader).map(|blob| ObjectBox::Blob(Box::new(blob)))
            }
            ObjectType::Tree => {
                Tree::deserialize(object_reader).map(|tree| ObjectBox::Tree(Box::new(tree)))
            }
            ObjectType::Commit => {
                Commit::deserialize(object_reader).map(|commit| ObjectBox::Commit(Box::new(commit)))
            }
        };

        parsed.map_err(|error| Self::corrupt(object_id, format!("{error:#}")))
    }

    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> anyhow::Result<Blob> {
        match self.parse_object(object_id)? {
            ObjectBox::Blob(blob) => Ok(*blob),
            other => Err(Self::unexpected_type(object_id, ObjectType::Blob, other.object_type())),
        }
    }

    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> anyhow::Result<Tree> {
        match self.parse_object(object_id)? {
            ObjectBox::Tree(tree) => Ok(*tree),
            other => Err(Self::unexpected_type(object_id, ObjectType::Tree, other.object_type())),
        }
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> anyhow::Result<Commit> {
        match self.parse_object(object_id)? {
            ObjectBox::Commit(commit) => Ok(*commit),
            other => Err(Self::unexpected_type(
                object_id,
                ObjectType::Commit,
                other.object_type(),
            )),
        }
    }

    /// Recursively walk a stored tree into a flat `path -> blob` map
    pub fn flatten_tree(&self, tree_oid: &ObjectId) -> anyhow::Result<BTreeMap<PathBuf, ObjectId>> {
        let mut files = BTreeMap::new();
        self.collect_tree_files(tree_oid, PathBuf::new(), &mut files)?;

        Ok(files)
    }

    fn collect_tree_files(
        &self,
        tree_oid: &ObjectId,
        prefix: PathBuf,
        files: &mut BTreeMap<PathBuf, ObjectId>,
    ) -> anyhow::Result<()> {
        let tree = self.parse_object_as_tree(tree_oid)?;

        for (name, entry) in tree.into_entries() {
            let path = prefix.join(name);
            match entry.mode {
                EntryMode::Directory => self.collect_tree_files(&entry.oid, path, files)?,
                EntryMode::File => {
                    files.insert(path, entry.oid);
                }
            }
        }

        Ok(())
    }

    /// Flattened tree of a commit
    pub fn commit_files(
        &self,
        commit_oid: &ObjectId,
    ) -> anyhow::Result<BTreeMap<PathBuf, ObjectId>> {
        let commit = self.parse_object_as_commit(commit_oid)?;

        self.flatten_tree(commit.tree_oid())
    }

    /// Read the object, check its header and digest, and return a reader over the payload
    fn parse_object_as_bytes(
        &self,
        object_id: &ObjectId,
    ) -> anyhow::Result<(ObjectType, Cursor<Bytes>)> {
        let object_content = self.load(object_id)?;

        if ObjectId::digest(&object_content) != *object_id {
            return Err(Self::corrupt(object_id, "digest does not match content".to_string()));
        }

        let mut object_reader = Cursor::new(object_content);
        let (object_type, size) = ObjectType::parse_header(&mut object_reader)
            .map_err(|error| Self::corrupt(object_id, format!("{error:#}")))?;

        let payload_size = object_reader.get_ref().len() - object_reader.position() as usize;
        if payload_size != size {
            return Err(Self::corrupt(
                object_id,
                format!("header declares {size} bytes but payload has {payload_size}"),
            ));
        }

        Ok((object_type, object_reader))
    }

    /// Decompressed canonical bytes of an object
    pub fn load(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        let object_path = self.path.join(object_id.to_path());

        let compressed = match std::fs::read(&object_path) {
            Ok(compressed) => compressed,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(TwigError::ObjectNotFound(object_id.clone()).into());
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("Unable to read object {}", object_path.display()));
            }
        };

        let mut canonical = Vec::new();
        flate2::read::ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut canonical)
            .map_err(|error| Self::corrupt(object_id, format!("not a zlib stream: {error}")))?;

        Ok(Bytes::from(canonical))
    }

    /// Deflate into a temporary file next to the final path, then rename it into place
    fn write_compressed(&self, object_id: &ObjectId, canonical: &[u8]) -> anyhow::Result<()> {
        let object_path = self.path.join(object_id.to_path());
        let fanout_dir = object_path
            .parent()
            .with_context(|| format!("Invalid object path {}", object_path.display()))?;
        std::fs::create_dir_all(fanout_dir)
            .with_context(|| format!("Unable to create {}", fanout_dir.display()))?;

        let temp_path = fanout_dir.join(format!(".incoming-{:08x}", rand::random::<u32>()));
        let temp_file = std::fs::File::create_new(&temp_path)
            .with_context(|| format!("Unable to create {}", temp_path.display()))?;

        let mut encoder =
            flate2::write::ZlibEncoder::new(temp_file, flate2::Compression::default());
        encoder
            .write_all(canonical)
            .and_then(|_| encoder.finish())
            .and_then(|file| file.sync_all())
            .with_context(|| format!("Unable to write {}", temp_path.display()))?;

        std::fs::rename(&temp_path, &object_path)
            .with_context(|| format!("Unable to move object into {}", object_path.display()))
    }

    fn corrupt(object_id: &ObjectId, reason: String) -> anyhow::Error {
        TwigError::CorruptObject {
            oid: object_id.clone(),
            reason,
        }
        .into()
    }

    fn unexpected_type(object_id: &ObjectId, expected: ObjectType, actual: ObjectType) -> anyhow::Error {
        Self::corrupt(object_id, format!("expected a {expected}, found a {actual}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;

    fn database(dir: &TempDir) -> Database {
        Database::new(dir.path().join("objects").into_boxed_path())
    }

    #[test]
    fn storing_identical_content_is_idempotent() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let database = database(&dir);

        let first = database.store(&Blob::new(Bytes::from_static(b"same")))?;
        let second = database.store(&Blob::new(Bytes::from_static(b"same")))?;
        let other = database.store(&Blob::new(Bytes::from_static(b"other")))?;

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(database.parse_object_as_blob(&first)?.content().as_ref(), b"same");

        Ok(())
    }

    #[test]
    fn missing_object_is_not_found() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let missing = ObjectId::try_parse("0".repeat(40))?;

        let error = database(&dir).parse_object(&missing).err().unwrap();

        assert_eq!(ErrorKind::classify(&error), ErrorKind::ObjectNotFound);

        Ok(())
    }

    #[test]
    fn tampered_object_is_corrupt() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let database = database(&dir);
        let oid = database.store(&Blob::new(Bytes::from_static(b"original")))?;

        let object_path = database.objects_path().join(oid.to_path());
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"blob 8\0tampered")?;
        std::fs::write(&object_path, encoder.finish()?)?;

        let error = database.parse_object(&oid).err().unwrap();
        assert_eq!(ErrorKind::classify(&error), ErrorKind::CorruptObject);

        std::fs::write(&object_path, b"not zlib at all")?;
        let error = database.parse_object(&oid).err().unwrap();
        assert_eq!(ErrorKind::classify(&error), ErrorKind::CorruptObject);

        Ok(())
    }

    #[test]
    fn stored_tree_flattens_back_to_its_snapshot() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let database = database(&dir);

        let mut snapshot = BTreeMap::new();
        for (path, content) in [("README", "readme"), ("src/lib.rs", "lib"), ("src/bin/main.rs", "main")] {
            let oid = database.store(&Blob::new(Bytes::from(content.to_string())))?;
            snapshot.insert(PathBuf::from(path), oid);
        }

        let tree = Tree::build(snapshot.clone())?;
        let tree_oid = database.store_tree(&tree)?;

        assert_eq!(database.flatten_tree(&tree_oid)?, snapshot);

        Ok(())
    }

    #[test]
    fn typed_parse_rejects_other_kinds() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let database = database(&dir);
        let oid = database.store(&Blob::new(Bytes::from_static(b"blob")))?;

        let error = database.parse_object_as_commit(&oid).err().unwrap();

        assert_eq!(ErrorKind::classify(&error), ErrorKind::CorruptObject);

        Ok(())
    }
}
