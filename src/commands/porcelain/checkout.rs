use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::checkout::migration::Migration;
use crate::errors::TwigError;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

impl Repository {
    /// Make `name` the current branch and rewrite the working directory to its tree
    ///
    /// Checkout is forceful: tracked files are overwritten or removed to match the
    /// target without any check for unsaved modifications. Untracked files are left
    /// alone, and the checkout is refused with `UntrackedOverwrite` before anything
    /// is written if the target needs their place. The staging index is cleared.
    #[tracing::instrument(skip(self))]
    pub fn checkout_branch(&self, name: &str) -> anyhow::Result<BranchName> {
        let branch_name = BranchName::try_parse(name.to_string())?;
        if !self.refs().branch_exists(&branch_name) {
            return Err(TwigError::BranchNotFound(branch_name.to_string()).into());
        }

        let target_files = match self.refs().read_branch(&branch_name)? {
            Some(target_oid) => self.database().commit_files(&target_oid)?,
            None => BTreeMap::new(),
        };
        let current_files = self.head_files()?;
        let staged_paths = self
            .load_index()?
            .entries()
            .map(|entry| entry.name.clone())
            .collect::<BTreeSet<_>>();

        let migration = Migration::plan(
            self.database(),
            self.workspace(),
            &current_files,
            &staged_paths,
            &target_files,
        )?;
        tracing::debug!(actions = migration.actions().len(), "checkout planned");
        self.workspace().apply_migration(&migration)?;

        self.refs().set_head(&branch_name)?;
        self.update_index(|index| {
            index.clear_entries();
            Ok(())
        })?;

        Ok(branch_name)
    }

    /// `checkout [-b] <name>`
    pub fn checkout(&self, name: &str, create: bool) -> anyhow::Result<()> {
        if create {
            let branch_name = self.create_branch(name)?;
            writeln!(self.writer(), "Switched to a new branch '{branch_name}'")?;
            return Ok(());
        }

        let was_current = BranchName::try_parse(name.to_string())
            .and_then(|branch_name| self.refs().is_current_branch(&branch_name))
            .unwrap_or(false);
        let branch_name = self.checkout_branch(name)?;

        if was_current {
            writeln!(self.writer(), "Already on '{branch_name}'")?;
        } else {
            writeln!(self.writer(), "Switched to branch '{branch_name}'")?;
        }

        Ok(())
    }
}
