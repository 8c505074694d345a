//! Branch references and HEAD
//!
//! Branches are files under `refs/heads/` holding the hex digest of their tip commit,
//! or nothing at all while the branch has no commits. HEAD is always symbolic:
//! `ref: refs/heads/<name>`.

use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::TwigError;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::Path;
use walkdir::WalkDir;

const SYMREF_REGEX: &str = r"^ref: (.+)$";
const HEAD_FILE_NAME: &str = "HEAD";

/// Branch and HEAD manager rooted at the metadata directory
#[derive(Debug, new)]
pub struct Refs {
    path: Box<Path>,
}

impl Refs {
    /// Branch named by HEAD
    pub fn current_branch(&self) -> anyhow::Result<BranchName> {
        let head_path = self.head_path();
        let content = std::fs::read_to_string(&head_path)
            .with_context(|| format!("failed to read HEAD at {:?}", head_path))?;
        let content = content.trim();

        let symref_match = regex::Regex::new(SYMREF_REGEX)?
            .captures(content)
            .ok_or_else(|| {
                TwigError::CorruptHead(format!("expected a symbolic ref, got '{content}'"))
            })?;

        BranchName::try_parse_ref_path(&symref_match[1])
            .map_err(|error| TwigError::CorruptHead(format!("{error:#}")).into())
    }

    pub fn is_current_branch(&self, branch_name: &BranchName) -> anyhow::Result<bool> {
        Ok(&self.current_branch()? == branch_name)
    }

    /// Point HEAD at a branch without touching the branch itself
    pub fn set_head(&self, branch_name: &BranchName) -> anyhow::Result<()> {
        self.update_ref_file(&self.head_path(), format!("ref: {}\n", branch_name.to_ref_path()))
    }

    /// Tip of the current branch, `None` while it has no commits
    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.read_branch(&self.current_branch()?)
    }

    pub fn branch_exists(&self, branch_name: &BranchName) -> bool {
        self.path.join(branch_name.to_path()).is_file()
    }

    /// Tip of a branch, `None` while it has no commits
    pub fn read_branch(&self, branch_name: &BranchName) -> anyhow::Result<Option<ObjectId>> {
        let ref_path = self.path.join(branch_name.to_path());

        let content = match std::fs::read_to_string(&ref_path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(TwigError::BranchNotFound(branch_name.to_string()).into());
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read ref file at {:?}", ref_path));
            }
        };
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        ObjectId::try_parse(content.to_string())
            .map(Some)
            .map_err(|error| {
                TwigError::CorruptRef {
                    name: branch_name.to_string(),
                    reason: format!("{error:#}"),
                }
                .into()
            })
    }

    pub fn update_branch(&self, branch_name: &BranchName, oid: &ObjectId) -> anyhow::Result<()> {
        tracing::debug!(branch = %branch_name, %oid, "updating branch");

        self.update_ref_file(&self.path.join(branch_name.to_path()), format!("{oid}\n"))
    }

    /// Create a branch pointing at `source_oid`, or empty when there is nothing to point at
    pub fn create_branch(
        &self,
        branch_name: &BranchName,
        source_oid: Option<&ObjectId>,
    ) -> anyhow::Result<()> {
        let branch_path = self.path.join(branch_name.to_path());

        // a file or a directory in the way both count as an existing name
        if branch_path.exists() {
            return Err(TwigError::BranchExists(branch_name.to_string()).into());
        }

        let raw_ref = source_oid.map(|oid| format!("{oid}\n")).unwrap_or_default();
        self.update_ref_file(&branch_path, raw_ref)
    }

    /// Remove a branch, returning the tip it pointed at
    pub fn delete_branch(&self, branch_name: &BranchName) -> anyhow::Result<Option<ObjectId>> {
        let branch_path = self.path.join(branch_name.to_path());
        let oid = self.read_branch(branch_name)?;

        std::fs::remove_file(&branch_path)
            .with_context(|| format!("failed to delete branch file at {:?}", branch_path))?;
        self.prune_empty_branch_dirs(&branch_path)?;

        Ok(oid)
    }

    /// All branches, sorted by name
    ///
    /// Files under `refs/heads` that are not valid branch names, such as leftover
    /// `.lock` files, are skipped.
    pub fn list_branches(&self) -> anyhow::Result<Vec<BranchName>> {
        let heads_path = self.heads_path();
        let mut branches = Vec::new();

        for entry in WalkDir::new(&heads_path) {
            let entry = entry.with_context(|| format!("Unable to list {:?}", heads_path))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative_path = entry.path().strip_prefix(&heads_path)?;
            let Some(name) = relative_path.to_str() else {
                continue;
            };
            if let Ok(branch_name) =
                BranchName::try_parse(name.replace(std::path::MAIN_SEPARATOR, "/"))
            {
                branches.push(branch_name);
            }
        }
        branches.sort();

        Ok(branches)
    }

    /// Replace a ref file through `<ref>.lock`, held exclusively while it is written
    fn update_ref_file(&self, path: &Path, raw_ref: String) -> anyhow::Result<()> {
        let parent = path
            .parent()
            .with_context(|| format!("ref path {:?} has no parent", path))?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create ref directory {:?}", parent))?;

        let file_name = path
            .file_name()
            .with_context(|| format!("ref path {:?} has no file name", path))?;
        let mut lock_name = file_name.to_os_string();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        let mut lock_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("unable to open ref lock {:?}", lock_path))?;

        let written =
            file_guard::lock(&mut lock_file, Lock::Exclusive, 0, 1).and_then(|mut guard| {
                guard.deref_mut().write_all(raw_ref.as_bytes())?;
                guard.deref_mut().sync_all()
            });
        if let Err(error) = written {
            let _ = std::fs::remove_file(&lock_path);
            return Err(error).with_context(|| format!("failed to write ref {:?}", path));
        }

        std::fs::rename(&lock_path, path)
            .with_context(|| format!("failed to move {:?} into place", lock_path))
    }

    /// Remove directories left empty under `refs/heads` by a deleted branch
    fn prune_empty_branch_dirs(&self, branch_path: &Path) -> anyhow::Result<()> {
        let heads_path = self.heads_path();

        for dir in branch_path.ancestors().skip(1) {
            if dir == heads_path.as_ref() || !dir.starts_with(&heads_path) {
                break;
            }
            if dir.read_dir()?.next().is_some() {
                break;
            }

            std::fs::remove_dir(dir)
                .with_context(|| format!("failed to remove empty branch directory {:?}", dir))?;
        }

        Ok(())
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join(HEAD_FILE_NAME).into_boxed_path()
    }

    pub fn refs_path(&self) -> Box<Path> {
        self.path.join("refs").into_boxed_path()
    }

    pub fn heads_path(&self) -> Box<Path> {
        self.refs_path().join("heads").into_boxed_path()
    }
}
