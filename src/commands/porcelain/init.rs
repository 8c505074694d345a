use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::errors::TwigError;
use anyhow::Context;
use std::fs;
use std::io::Write;

impl Repository {
    /// Create the metadata directory with an unborn initial branch
    ///
    /// The initial branch is `initial_branch` when given, else the configured default.
    #[tracing::instrument(skip(self), fields(path = %self.path().display()))]
    pub fn init(&mut self, initial_branch: Option<&str>) -> anyhow::Result<()> {
        if self.is_initialized() {
            return Err(TwigError::AlreadyInitialized(self.metadata_path()).into());
        }

        let branch_name = match initial_branch {
            Some(name) => BranchName::try_parse(name.to_string())?,
            None => BranchName::try_parse(self.config().core.default_branch.clone())?,
        };

        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create objects directory")?;
        fs::create_dir_all(self.refs().heads_path())
            .context("Failed to create refs/heads directory")?;

        let config = self
            .config()
            .clone()
            .with_default_branch(branch_name.as_ref());
        config.save(&self.config_path())?;
        self.set_config(config);

        self.refs()
            .create_branch(&branch_name, None)
            .context("Failed to create initial branch")?;
        self.refs()
            .set_head(&branch_name)
            .context("Failed to create initial HEAD reference")?;

        tracing::info!(branch = %branch_name, "repository initialized");

        writeln!(
            self.writer(),
            "Initialized empty twig repository in {}",
            self.metadata_path().display()
        )?;

        Ok(())
    }
}
