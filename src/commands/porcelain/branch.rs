use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::TwigError;
use std::io::Write;

impl Repository {
    /// Create a branch at the current tip and make it current
    ///
    /// The working directory and the index are left untouched. Creating a branch
    /// while the current one is unborn yields another unborn branch.
    #[tracing::instrument(skip(self))]
    pub fn create_branch(&self, name: &str) -> anyhow::Result<BranchName> {
        let branch_name = BranchName::try_parse(name.to_string())?;
        let tip = self.refs().read_head()?;

        self.refs().create_branch(&branch_name, tip.as_ref())?;
        self.refs().set_head(&branch_name)?;

        Ok(branch_name)
    }

    /// Delete a branch, returning the tip it pointed at
    ///
    /// Deleting the current branch moves HEAD to the configured default branch
    /// first, which must be a different, existing branch.
    #[tracing::instrument(skip(self))]
    pub fn delete_branch(&self, name: &str) -> anyhow::Result<Option<ObjectId>> {
        let branch_name = BranchName::try_parse(name.to_string())?;
        // surfaces BranchNotFound before anything moves
        self.refs().read_branch(&branch_name)?;

        if self.refs().is_current_branch(&branch_name)? {
            let fallback = BranchName::try_parse(self.config().core.default_branch.clone())
                .ok()
                .filter(|fallback| *fallback != branch_name && self.refs().branch_exists(fallback))
                .ok_or_else(|| TwigError::CannotDeleteCurrentBranch(branch_name.to_string()))?;

            tracing::debug!(fallback = %fallback, "moving HEAD off the deleted branch");
            self.refs().set_head(&fallback)?;
        }

        self.refs().delete_branch(&branch_name)
    }

    pub fn list_branches(&self) -> anyhow::Result<Vec<BranchName>> {
        self.refs().list_branches()
    }

    /// Point HEAD at an existing branch without touching the working directory
    pub fn switch_branch(&self, name: &str) -> anyhow::Result<BranchName> {
        let branch_name = BranchName::try_parse(name.to_string())?;
        if !self.refs().branch_exists(&branch_name) {
            return Err(TwigError::BranchNotFound(branch_name.to_string()).into());
        }

        self.refs().set_head(&branch_name)?;

        Ok(branch_name)
    }

    /// `branch [-b <name> | -d <name>]`, listing branches when neither is given
    pub fn branch(&self, create: Option<&str>, delete: Option<&str>) -> anyhow::Result<()> {
        if let Some(name) = create {
            let branch_name = self.create_branch(name)?;
            writeln!(self.writer(), "Switched to a new branch '{branch_name}'")?;
            return Ok(());
        }

        if let Some(name) = delete {
            let tip = self.delete_branch(name)?;
            let was = tip
                .map(|oid| oid.to_short_oid())
                .unwrap_or_else(|| "unborn".to_string());
            writeln!(self.writer(), "Deleted branch {name} (was {was}).")?;
            return Ok(());
        }

        let current = self.refs().current_branch()?;
        for branch_name in self.list_branches()? {
            let marker = if branch_name == current { "* " } else { "  " };
            writeln!(self.writer(), "{marker}{branch_name}")?;
        }

        Ok(())
    }
}
