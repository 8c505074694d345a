use crate::METADATA_DIR;
use crate::artifacts::checkout::migration::{ActionType, Migration};
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory names never listed or staged
const IGNORED_PATHS: [&str; 2] = [METADATA_DIR, ".git"];

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parse_blob(&self, path: &Path) -> anyhow::Result<Blob> {
        let data = self.read_file(path)?;
        Ok(Blob::new(data))
    }

    /// Digest the file would get as a blob, `None` when there is no regular file there
    pub fn blob_oid(&self, path: &Path) -> anyhow::Result<Option<ObjectId>> {
        if !self.is_file(path) {
            return Ok(None);
        }

        self.parse_blob(path)?.object_id().map(Some)
    }

    pub fn is_file(&self, path: &Path) -> bool {
        std::fs::symlink_metadata(self.path.join(path))
            .map(|metadata| metadata.is_file())
            .unwrap_or(false)
    }

    pub fn exists(&self, path: &Path) -> bool {
        std::fs::symlink_metadata(self.path.join(path)).is_ok()
    }

    /// Regular files beneath `root` (or the whole workspace), relative to the workspace
    /// and sorted
    pub fn list_files(&self, root: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
        let root_path = match root {
            Some(p) => self.path.join(p),
            None => self.path.to_path_buf(),
        };

        if Self::is_ignored(root.unwrap_or(Path::new(""))) {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !Self::is_ignored_name(entry.file_name()));

        for entry in walker {
            let entry = entry.with_context(|| format!("Unable to list {}", root_path.display()))?;

            if entry.file_type().is_file() {
                let relative = entry
                    .path()
                    .strip_prefix(self.path.as_ref())
                    .with_context(|| {
                        format!("{} is outside the workspace", entry.path().display())
                    })?;
                files.push(relative.to_path_buf());
            }
        }
        files.sort();

        Ok(files)
    }

    fn is_ignored_name(name: &std::ffi::OsStr) -> bool {
        IGNORED_PATHS.iter().any(|ignored| name == *ignored)
    }

    /// Whether any component of a relative path is an ignored directory
    pub fn is_ignored(path: &Path) -> bool {
        path.components().any(|component| match component {
            std::path::Component::Normal(name) => Self::is_ignored_name(name),
            _ => false,
        })
    }

    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<Bytes> {
        let file_path = self.path.join(file_path);

        let content = std::fs::read(&file_path)
            .with_context(|| format!("Unable to read {}", file_path.display()))?;

        Ok(Bytes::from(content))
    }

    /// Write a file, replacing whatever stands in its way
    ///
    /// A directory at the path is removed, as is any file standing where one of its
    /// parent directories goes.
    pub fn write_file(&self, file_path: &Path, data: &[u8]) -> anyhow::Result<()> {
        let mut prefix = PathBuf::new();
        for parent in file_path.parent().into_iter().flat_map(|parent| parent.components()) {
            prefix.push(parent);
            let dir_path = self.path.join(&prefix);

            match std::fs::symlink_metadata(&dir_path) {
                Ok(metadata) if metadata.is_dir() => {}
                Ok(_) => {
                    std::fs::remove_file(&dir_path)
                        .with_context(|| format!("Failed to remove file: {:?}", prefix))?;
                    std::fs::create_dir(&dir_path)
                        .with_context(|| format!("Failed to create directory: {:?}", prefix))?;
                }
                Err(_) => {
                    std::fs::create_dir(&dir_path)
                        .with_context(|| format!("Failed to create directory: {:?}", prefix))?;
                }
            }
        }

        let path = self.path.join(file_path);
        if let Ok(metadata) = std::fs::symlink_metadata(&path)
            && metadata.is_dir()
        {
            std::fs::remove_dir_all(&path)
                .with_context(|| format!("Failed to remove existing directory: {:?}", file_path))?;
        }

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("Failed to open file: {:?}", file_path))?;

        file.write_all(data)
            .with_context(|| format!("Failed to write to file: {:?}", file_path))?;

        Ok(())
    }

    /// Remove a file if it is still there
    pub fn remove_file(&self, file_path: &Path) -> anyhow::Result<()> {
        let path = self.path.join(file_path);

        match std::fs::symlink_metadata(&path) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove file: {:?}", file_path)),
            Err(_) => Ok(()),
        }
    }

    /// Remove a directory and then its parents for as long as they are empty
    pub fn prune_empty_dirs(&self, dir_path: &Path) -> anyhow::Result<()> {
        for ancestor in dir_path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }

            let path = self.path.join(ancestor);
            let is_empty = match std::fs::read_dir(&path) {
                Ok(mut entries) => entries.next().is_none(),
                Err(_) => continue,
            };

            if !is_empty {
                break;
            }

            std::fs::remove_dir(&path)
                .with_context(|| format!("Failed to remove directory: {:?}", ancestor))?;
        }

        Ok(())
    }

    // Deletions run first, then emptied directories are pruned deepest first, then
    // files are written, creating their directories as needed.
    pub fn apply_migration(&self, migration: &Migration) -> anyhow::Result<()> {
        for (file_path, _) in migration.actions_of(ActionType::Delete) {
            tracing::debug!(path = %file_path.display(), "removing file");
            self.remove_file(file_path)?;
        }

        for dir_path in migration.rmdirs().iter().rev() {
            self.prune_empty_dirs(dir_path)?;
        }

        for action in [ActionType::Modify, ActionType::Add] {
            for (file_path, oid) in migration.actions_of(action) {
                let oid = oid
                    .as_ref()
                    .ok_or_else(|| {
                        anyhow::anyhow!("Entry must be provided for {action:?} actions")
                    })?;
                let data = migration.load_blob_data(oid)?;

                tracing::debug!(path = %file_path.display(), %oid, "writing file");
                self.write_file(file_path, &data)?;
            }
        }

        Ok(())
    }
}
