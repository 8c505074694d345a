use crate::areas::repository::Repository;
use crate::artifacts::status::status_info::{Status, StatusInfo};
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// Reconcile HEAD, the staging index and the working directory
    pub fn status_report(&self) -> anyhow::Result<StatusInfo> {
        let index = self.load_index()?;

        Status::new(self).initialize(&index)
    }

    /// `status [--porcelain]`
    pub fn status(&self, porcelain: bool) -> anyhow::Result<()> {
        let status = self.status_report()?;

        if porcelain {
            self.print_porcelain_status(&status)
        } else {
            self.print_long_status(&status)
        }
    }

    fn print_porcelain_status(&self, status: &StatusInfo) -> anyhow::Result<()> {
        let mut writer = self.writer();

        for (path, file_status) in status.changes() {
            writeln!(writer, "{} {}", file_status.porcelain_code(), path.display())?;
        }

        Ok(())
    }

    fn print_long_status(&self, status: &StatusInfo) -> anyhow::Result<()> {
        let mut writer = self.writer();

        writeln!(writer, "On branch {}", status.branch())?;

        if status.is_clean() {
            writeln!(writer, "nothing to commit, working tree clean")?;
            return Ok(());
        }

        let staged = status.staged().collect::<Vec<_>>();
        if !staged.is_empty() {
            writeln!(writer, "Changes to be committed:")?;
            for (path, file_status) in staged {
                let path = path.display().to_string();
                writeln!(writer, "{}{}", file_status, path.as_str().green())?;
            }
            writeln!(writer)?;
        }

        let unstaged = status.unstaged().collect::<Vec<_>>();
        if !unstaged.is_empty() {
            writeln!(writer, "Changes not staged for commit:")?;
            for (path, file_status) in unstaged {
                let path = path.display().to_string();
                writeln!(writer, "{}{}", file_status, path.as_str().red())?;
            }
            writeln!(writer)?;
        }

        let untracked = status.untracked().collect::<Vec<_>>();
        if !untracked.is_empty() {
            writeln!(writer, "Untracked files:")?;
            for path in untracked {
                let path = path.display().to_string();
                writeln!(writer, "{:>8}{}", "", path.as_str().red())?;
            }
            writeln!(writer)?;
        }

        if !status.has_staged_changes() {
            writeln!(writer, "no changes added to commit")?;
        }

        Ok(())
    }
}
