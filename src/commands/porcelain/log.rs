use crate::CommitDisplayFormat;
use crate::areas::repository::Repository;
use crate::artifacts::log::rev_list::RevList;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// History of the current branch, newest first
    pub fn rev_list(&self) -> anyhow::Result<RevList<'_>> {
        Ok(RevList::new(self.database(), self.refs().read_head()?))
    }

    /// `log [-n <limit>] [--oneline]`
    pub fn log(&self, limit: Option<usize>, format: CommitDisplayFormat) -> anyhow::Result<()> {
        let rev_list = self.rev_list()?;

        for (position, entry) in rev_list.take(limit.unwrap_or(usize::MAX)).enumerate() {
            let (oid, commit) = entry?;

            match format {
                CommitDisplayFormat::Medium => {
                    if position > 0 {
                        writeln!(self.writer())?;
                    }
                    self.show_commit_medium(&oid, &commit)?;
                }
                CommitDisplayFormat::OneLine => {
                    writeln!(
                        self.writer(),
                        "{} {}",
                        oid.to_short_oid().as_str().yellow(),
                        commit.short_message()
                    )?;
                }
            }
        }

        Ok(())
    }

    fn show_commit_medium(&self, oid: &ObjectId, commit: &Commit) -> anyhow::Result<()> {
        let author = commit.author();
        let mut writer = self.writer();

        writeln!(writer, "{}", format!("commit {oid}").as_str().yellow())?;
        writeln!(writer, "Author: {}", author.display_name())?;
        writeln!(writer, "Date:   {}", author.readable_timestamp())?;
        writeln!(writer)?;
        for line in commit.message().lines() {
            writeln!(writer, "    {line}")?;
        }

        Ok(())
    }
}
