//! Checkout migration
//!
//! Plans the file system operations that turn the working directory into the
//! materialization of a target tree:
//!
//! 1. Files of the current tree that the target does not have are deleted
//! 2. Directories left empty by those deletions are pruned
//! 3. Target files missing on disk are added, and those whose content differs are
//!    rewritten
//!
//! Files that neither the current tree nor the index know about are never touched.
//! When a target file needs the place of one of them (the file itself, a directory
//! holding it, or a file standing where a parent directory goes) planning fails with
//! `UntrackedOverwrite` before anything is written.

use crate::areas::database::Database;
use crate::areas::workspace::Workspace;
use crate::artifacts::index::index_entry::parent_dirs;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::TwigError;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Type of file system action required for checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionType {
    /// Create new file
    Add,
    /// Delete file
    Delete,
    /// Rewrite existing file
    Modify,
}

/// Planned actions grouped by type
pub type ActionsSet = BTreeMap<ActionType, Vec<(PathBuf, Option<ObjectId>)>>;

pub struct Migration<'r> {
    database: &'r Database,
    actions: ActionsSet,
    /// Directories that may be left empty by deletions
    rmdirs: BTreeSet<PathBuf>,
}

impl<'r> Migration<'r> {
    /// Compare the current and target snapshots against the files on disk
    ///
    /// `staged` holds the paths the index knows about besides the current tree.
    pub fn plan(
        database: &'r Database,
        workspace: &Workspace,
        current: &BTreeMap<PathBuf, ObjectId>,
        staged: &BTreeSet<PathBuf>,
        target: &BTreeMap<PathBuf, ObjectId>,
    ) -> anyhow::Result<Self> {
        let is_tracked = |path: &Path| current.contains_key(path) || staged.contains(path);

        let mut migration = Migration {
            database,
            actions: BTreeMap::new(),
            rmdirs: BTreeSet::new(),
        };

        for path in current.keys().filter(|path| !target.contains_key(*path)) {
            migration.record_deletion(path);
        }

        for (path, oid) in target {
            let disk_oid = workspace.blob_oid(path)?;
            if disk_oid.as_ref() != Some(oid) {
                check_untracked_in_the_way(workspace, path, &is_tracked)?;
            }

            match disk_oid {
                Some(disk_oid) if &disk_oid == oid => {}
                Some(_) => migration.record_write(ActionType::Modify, path, oid),
                // a directory standing where the file goes counts as a rewrite
                None if workspace.exists(path) => {
                    migration.record_write(ActionType::Modify, path, oid)
                }
                None => migration.record_write(ActionType::Add, path, oid),
            }
        }

        Ok(migration)
    }

    fn record_deletion(&mut self, path: &Path) {
        for parent in parent_dirs(path) {
            self.rmdirs.insert(parent.to_path_buf());
        }

        self.actions
            .entry(ActionType::Delete)
            .or_default()
            .push((path.to_path_buf(), None));
    }

    fn record_write(&mut self, action: ActionType, path: &Path, oid: &ObjectId) {
        self.actions
            .entry(action)
            .or_default()
            .push((path.to_path_buf(), Some(oid.clone())));
    }

    pub fn actions(&self) -> &ActionsSet {
        &self.actions
    }

    pub fn actions_of(&self, action: ActionType) -> &[(PathBuf, Option<ObjectId>)] {
        self.actions
            .get(&action)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn rmdirs(&self) -> &BTreeSet<PathBuf> {
        &self.rmdirs
    }

    pub fn is_empty(&self) -> bool {
        self.actions.values().all(Vec::is_empty)
    }

    pub fn load_blob_data(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        let blob = self.database.parse_object_as_blob(object_id)?;

        Ok(blob.into_content())
    }
}

/// Fail when writing `path` would destroy a file no snapshot knows about
fn check_untracked_in_the_way(
    workspace: &Workspace,
    path: &Path,
    is_tracked: impl Fn(&Path) -> bool,
) -> anyhow::Result<()> {
    let in_the_way = if workspace.is_file(path) {
        vec![path.to_path_buf()]
    } else if workspace.exists(path) {
        workspace.list_files(Some(path))?
    } else {
        parent_dirs(path)
            .into_iter()
            .filter(|dir| workspace.is_file(dir))
            .map(Path::to_path_buf)
            .collect()
    };

    match in_the_way.into_iter().find(|file| !is_tracked(file)) {
        Some(untracked) => Err(TwigError::UntrackedOverwrite(untracked).into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::blob::Blob;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plan_only_touches_what_differs() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let database = Database::new(dir.path().join(".twig/objects").into_boxed_path());
        let workspace = Workspace::new(dir.path().to_path_buf().into_boxed_path());

        let same = database.store(&Blob::new(Bytes::from_static(b"same")))?;
        let old = database.store(&Blob::new(Bytes::from_static(b"old")))?;
        let new = database.store(&Blob::new(Bytes::from_static(b"new")))?;
        dir.child("same.txt").write_str("same")?;
        dir.child("changed.txt").write_str("old")?;
        dir.child("dir/removed.txt").write_str("old")?;

        let current = BTreeMap::from([
            (PathBuf::from("same.txt"), same.clone()),
            (PathBuf::from("changed.txt"), old.clone()),
            (PathBuf::from("dir/removed.txt"), old),
        ]);
        let target = BTreeMap::from([
            (PathBuf::from("same.txt"), same),
            (PathBuf::from("changed.txt"), new.clone()),
            (PathBuf::from("added.txt"), new.clone()),
        ]);

        let migration =
            Migration::plan(&database, &workspace, &current, &BTreeSet::new(), &target)?;

        assert_eq!(
            migration.actions_of(ActionType::Delete),
            &[(PathBuf::from("dir/removed.txt"), None::<ObjectId>)]
        );
        assert_eq!(
            migration.actions_of(ActionType::Modify),
            &[(PathBuf::from("changed.txt"), Some(new.clone()))]
        );
        assert_eq!(
            migration.actions_of(ActionType::Add),
            &[(PathBuf::from("added.txt"), Some(new))]
        );
        assert_eq!(migration.rmdirs(), &BTreeSet::from([PathBuf::from("dir")]));

        workspace.apply_migration(&migration)?;

        dir.child("changed.txt").assert("new");
        dir.child("added.txt").assert("new");
        assert!(!dir.child("dir").path().exists());

        Ok(())
    }

    fn untracked_in_the_way(
        dir: &TempDir,
        staged: &BTreeSet<PathBuf>,
    ) -> anyhow::Result<Option<PathBuf>> {
        let database = Database::new(dir.path().join(".twig/objects").into_boxed_path());
        let workspace = Workspace::new(dir.path().to_path_buf().into_boxed_path());
        let oid = database.store(&Blob::new(Bytes::from_static(b"tracked")))?;
        let target = BTreeMap::from([
            (PathBuf::from("x"), oid.clone()),
            (PathBuf::from("y/inner.txt"), oid),
        ]);

        match Migration::plan(&database, &workspace, &BTreeMap::new(), staged, &target) {
            Ok(_) => Ok(None),
            Err(error) => match error.downcast::<TwigError>()? {
                TwigError::UntrackedOverwrite(path) => Ok(Some(path)),
                other => Err(other.into()),
            },
        }
    }

    #[test]
    fn untracked_directory_in_the_way_is_refused() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        dir.child("x/precious.txt").write_str("keep me")?;

        assert_eq!(
            untracked_in_the_way(&dir, &BTreeSet::new())?,
            Some(PathBuf::from("x/precious.txt"))
        );
        dir.child("x/precious.txt").assert("keep me");

        Ok(())
    }

    #[test]
    fn untracked_file_in_the_way_is_refused() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        dir.child("x").write_str("local")?;

        assert_eq!(untracked_in_the_way(&dir, &BTreeSet::new())?, Some(PathBuf::from("x")));

        Ok(())
    }

    #[test]
    fn untracked_file_standing_on_a_parent_dir_is_refused() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        dir.child("y").write_str("local")?;

        assert_eq!(untracked_in_the_way(&dir, &BTreeSet::new())?, Some(PathBuf::from("y")));
        dir.child("y").assert("local");

        Ok(())
    }

    #[test]
    fn staged_or_identical_files_do_not_block() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        dir.child("x").write_str("tracked")?;
        dir.child("y").write_str("staged")?;

        let staged = BTreeSet::from([PathBuf::from("y")]);
        assert_eq!(untracked_in_the_way(&dir, &staged)?, None);

        Ok(())
    }
}
