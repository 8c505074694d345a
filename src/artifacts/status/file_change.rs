use colored::Colorize;

const LABEL_WIDTH: usize = 8;

/// Category of a path relative to HEAD, the staged snapshot and the working directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileStatus {
    /// Staged, absent from HEAD
    StagedNew,
    /// Staged with content different from HEAD
    StagedModified,
    /// In HEAD, removed from the staged snapshot
    StagedDeleted,
    /// On disk with content different from the staged snapshot
    UnstagedModified,
    /// In the staged snapshot, missing on disk
    Deleted,
    /// On disk, unknown to HEAD and the staged snapshot
    Untracked,
}

impl FileStatus {
    pub fn is_staged(&self) -> bool {
        matches!(
            self,
            FileStatus::StagedNew | FileStatus::StagedModified | FileStatus::StagedDeleted
        )
    }

    pub fn is_unstaged(&self) -> bool {
        matches!(self, FileStatus::UnstagedModified | FileStatus::Deleted)
    }

    /// Two-column code used by `status --porcelain`
    pub fn porcelain_code(&self) -> &'static str {
        match self {
            FileStatus::StagedNew => "A ",
            FileStatus::StagedModified => "M ",
            FileStatus::StagedDeleted => "D ",
            FileStatus::UnstagedModified => " M",
            FileStatus::Deleted => " D",
            FileStatus::Untracked => "??",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::StagedNew => "new file:   ",
            FileStatus::StagedModified | FileStatus::UnstagedModified => "modified:   ",
            FileStatus::StagedDeleted | FileStatus::Deleted => "deleted:    ",
            FileStatus::Untracked => "",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let colored_str = if self.is_staged() {
            self.label().green()
        } else if self.is_unstaged() {
            self.label().red()
        } else {
            self.label().normal()
        };

        write!(f, "{:>width$}{}", "", colored_str, width = LABEL_WIDTH)
    }
}
