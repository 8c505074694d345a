use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::status::file_change::FileStatus;
use crate::artifacts::status::inspector::Inspector;
use derive_new::new;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub type ChangeSet = BTreeMap<PathBuf, FileStatus>;

/// Result of inspecting a repository: the current branch and every path that is not clean
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusInfo {
    pub(crate) branch: BranchName,
    pub(crate) changes: ChangeSet,
}

impl StatusInfo {
    pub fn branch(&self) -> &BranchName {
        &self.branch
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn get(&self, path: &Path) -> Option<FileStatus> {
        self.changes.get(path).copied()
    }

    pub fn is_clean(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn has_staged_changes(&self) -> bool {
        self.changes.values().any(FileStatus::is_staged)
    }

    pub fn staged(&self) -> impl Iterator<Item = (&PathBuf, &FileStatus)> {
        self.changes.iter().filter(|(_, status)| status.is_staged())
    }

    pub fn unstaged(&self) -> impl Iterator<Item = (&PathBuf, &FileStatus)> {
        self.changes.iter().filter(|(_, status)| status.is_unstaged())
    }

    pub fn untracked(&self) -> impl Iterator<Item = &PathBuf> {
        self.changes
            .iter()
            .filter(|(_, status)| **status == FileStatus::Untracked)
            .map(|(path, _)| path)
    }
}

#[derive(new)]
pub struct Status<'r> {
    repository: &'r Repository,
}

impl<'r> Status<'r> {
    /// Reconcile HEAD's tree, the staged snapshot and the working directory
    pub fn initialize(&self, index: &Index) -> anyhow::Result<StatusInfo> {
        let branch = self.repository.refs().current_branch()?;
        let head_tree = self.repository.head_files()?;
        let staged = index.overlay(head_tree.clone());
        let workspace_files = self.repository.workspace().list_files(None)?;

        let inspector = Inspector::new(self.repository.workspace());

        let paths = head_tree
            .keys()
            .chain(staged.keys())
            .chain(workspace_files.iter())
            .collect::<BTreeSet<_>>();

        let mut changes = ChangeSet::new();
        for path in paths {
            if let Some(status) = inspector.inspect(path, head_tree.get(path), staged.get(path))? {
                changes.insert(path.clone(), status);
            }
        }

        tracing::debug!(branch = %branch, changes = changes.len(), "status computed");

        Ok(StatusInfo { branch, changes })
    }
}
