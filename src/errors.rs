//! Error kinds surfaced by the core
//!
//! Core operations propagate `anyhow::Result` and raise a [`TwigError`] whenever a
//! failure has a domain meaning. I/O failures stay plain `std::io::Error`s wrapped in
//! context and are classified as [`ErrorKind::Storage`].

use crate::artifacts::objects::object_id::ObjectId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TwigError {
    #[error("not a twig repository (or any parent up to mount point): {}", .0.display())]
    NotARepository(PathBuf),

    #[error("repository already exists in {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),

    #[error("object {oid} is corrupt: {reason}")]
    CorruptObject { oid: ObjectId, reason: String },

    #[error("index file is corrupt: {0}")]
    CorruptIndex(String),

    #[error("HEAD is corrupt: {0}")]
    CorruptHead(String),

    #[error("conflicting paths in snapshot: '{}'", .0.display())]
    PathConflict(PathBuf),

    #[error("pathspec '{}' did not match any files", .0.display())]
    PathNotFound(PathBuf),

    #[error("path '{}' is outside repository", .0.display())]
    PathOutsideRepository(PathBuf),

    #[error("a branch named '{0}' already exists")]
    BranchExists(String),

    #[error("branch '{0}' not found")]
    BranchNotFound(String),

    #[error("'{0}' is not a valid branch name")]
    InvalidBranchName(String),

    #[error("cannot delete branch '{0}' checked out without a fallback branch")]
    CannotDeleteCurrentBranch(String),

    #[error("invalid author identity: {0}")]
    InvalidAuthor(String),

    #[error("ref '{name}' is corrupt: {reason}")]
    CorruptRef { name: String, reason: String },

    #[error("untracked working tree file '{}' would be overwritten by checkout", .0.display())]
    UntrackedOverwrite(PathBuf),

    #[error("nothing to commit, working tree clean")]
    NothingStaged,
}

/// Coarse classification of a failure, used by the CLI to pick an exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Storage,
    ObjectNotFound,
    CorruptObject,
    PathConflict,
    BranchExists,
    BranchNotFound,
    NothingStaged,
    Usage,
}

impl ErrorKind {
    /// Walk the error chain and report the first recognised kind
    pub fn classify(error: &anyhow::Error) -> Self {
        for cause in error.chain() {
            if let Some(twig_error) = cause.downcast_ref::<TwigError>() {
                return twig_error.kind();
            }
            if cause.downcast_ref::<std::io::Error>().is_some() {
                return ErrorKind::Storage;
            }
        }

        ErrorKind::Usage
    }

    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::NothingStaged => 1,
            ErrorKind::Usage => 2,
            ErrorKind::PathConflict => 3,
            ErrorKind::BranchExists | ErrorKind::BranchNotFound => 4,
            ErrorKind::ObjectNotFound | ErrorKind::CorruptObject => 5,
            ErrorKind::Storage => 6,
        }
    }
}

impl TwigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TwigError::ObjectNotFound(_) => ErrorKind::ObjectNotFound,
            TwigError::CorruptObject { .. }
            | TwigError::CorruptIndex(_)
            | TwigError::CorruptHead(_)
            | TwigError::CorruptRef { .. } => ErrorKind::CorruptObject,
            TwigError::PathConflict(_) => ErrorKind::PathConflict,
            TwigError::BranchExists(_) => ErrorKind::BranchExists,
            TwigError::BranchNotFound(_) => ErrorKind::BranchNotFound,
            TwigError::NothingStaged => ErrorKind::NothingStaged,
            TwigError::NotARepository(_)
            | TwigError::AlreadyInitialized(_)
            | TwigError::PathNotFound(_)
            | TwigError::PathOutsideRepository(_)
            | TwigError::InvalidBranchName(_)
            | TwigError::CannotDeleteCurrentBranch(_)
            | TwigError::InvalidAuthor(_)
            | TwigError::UntrackedOverwrite(_) => ErrorKind::Usage,
        }
    }
}
