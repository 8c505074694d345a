use crate::areas::workspace::Workspace;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::status::file_change::FileStatus;
use derive_new::new;
use std::path::Path;

/// Classifies paths against the working directory
#[derive(new)]
pub struct Inspector<'r> {
    workspace: &'r Workspace,
}

impl<'r> Inspector<'r> {
    /// Category of `path`, `None` when it is clean
    pub fn inspect(
        &self,
        path: &Path,
        head: Option<&ObjectId>,
        staged: Option<&ObjectId>,
    ) -> anyhow::Result<Option<FileStatus>> {
        let on_disk = self.workspace.blob_oid(path)?;

        Ok(classify(head, staged, on_disk.as_ref()))
    }
}

/// Category of a path given its digest in HEAD, in the staged snapshot and on disk
///
/// Precedence: StagedDeleted, Deleted, StagedNew/StagedModified, UnstagedModified,
/// Untracked.
pub fn classify(
    head: Option<&ObjectId>,
    staged: Option<&ObjectId>,
    on_disk: Option<&ObjectId>,
) -> Option<FileStatus> {
    match (head, staged, on_disk) {
        (Some(_), None, _) => Some(FileStatus::StagedDeleted),
        (_, Some(_), None) => Some(FileStatus::Deleted),
        (None, Some(_), Some(_)) => Some(FileStatus::StagedNew),
        (Some(head), Some(staged), Some(_)) if head != staged => Some(FileStatus::StagedModified),
        (_, Some(staged), Some(on_disk)) if staged != on_disk => {
            Some(FileStatus::UnstagedModified)
        }
        (None, None, Some(_)) => Some(FileStatus::Untracked),
        _ => None,
    }
}
