use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{AUTHOR_EMAIL_ENV, AUTHOR_NAME_ENV, Author, Commit};
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::errors::TwigError;
use std::io::Write;

const FALLBACK_AUTHOR_NAME: &str = "Twig User";
const FALLBACK_AUTHOR_EMAIL: &str = "user@twig.local";

impl Repository {
    /// Identity recorded on new commits
    ///
    /// An explicit `Name <email>` wins, then the `TWIG_AUTHOR_NAME`/`TWIG_AUTHOR_EMAIL`
    /// environment variables, then the `[user]` section of the config. Whatever the
    /// source, the identity is checked before it can reach a commit object.
    pub fn resolve_author(&self, identity: Option<&str>) -> anyhow::Result<Author> {
        let (name, email) = match identity {
            Some(identity) => Author::parse_identity(identity)?,
            None => {
                let user = &self.config().user;
                let name = std::env::var(AUTHOR_NAME_ENV)
                    .ok()
                    .or_else(|| user.name.clone())
                    .unwrap_or_else(|| FALLBACK_AUTHOR_NAME.to_string());
                let email = std::env::var(AUTHOR_EMAIL_ENV)
                    .ok()
                    .or_else(|| user.email.clone())
                    .unwrap_or_else(|| FALLBACK_AUTHOR_EMAIL.to_string());
                let (name, email) = (name.trim().to_string(), email.trim().to_string());
                Author::check_identity(&name, &email)?;

                (name, email)
            }
        };

        Ok(match Author::timestamp_from_env() {
            Some(timestamp) => Author::new_with_timestamp(name, email, timestamp),
            None => Author::new(name, email),
        })
    }

    /// Record the staged snapshot as a new commit on the current branch
    ///
    /// The snapshot is HEAD's tree with the index laid over it. When it matches the
    /// parent's tree exactly the commit is refused with `NothingStaged`. The index is
    /// cleared after the branch moves.
    #[tracing::instrument(skip(self, author), fields(author = %author.display_name()))]
    pub fn create_commit(
        &self,
        message: &str,
        author: Author,
    ) -> anyhow::Result<(ObjectId, Commit)> {
        let message = message.trim();
        if message.is_empty() {
            anyhow::bail!("Aborting commit due to empty commit message");
        }
        author.validate()?;

        let branch = self.refs().current_branch()?;
        let parent = self.refs().read_branch(&branch)?;

        self.update_index(|index| {
            let tree = Tree::build(self.staged_files(index)?)?;

            if let Some(parent_oid) = &parent {
                let parent_commit = self.database().parse_object_as_commit(parent_oid)?;
                if tree.object_id()? == *parent_commit.tree_oid() {
                    index.clear_entries();
                    return Err(TwigError::NothingStaged.into());
                }
            }

            let tree_oid = self.database().store_tree(&tree)?;
            let commit = Commit::new(
                parent.into_iter().collect(),
                tree_oid,
                author,
                message.to_string(),
            );
            let commit_oid = self.database().store(&commit)?;

            self.refs().update_branch(&branch, &commit_oid)?;
            index.clear_entries();

            tracing::info!(branch = %branch, oid = %commit_oid, "commit created");

            Ok((commit_oid, commit))
        })
    }

    /// `commit -m <message> [--author <identity>]`
    pub fn commit(&self, message: &str, author: Option<&str>) -> anyhow::Result<()> {
        let author = self.resolve_author(author)?;
        let (commit_oid, commit) = self.create_commit(message, author)?;
        let branch = self.refs().current_branch()?;

        let root_marker = if commit.parent().is_none() {
            " (root-commit)"
        } else {
            ""
        };

        writeln!(
            self.writer(),
            "[{}{} {}] {}",
            branch,
            root_marker,
            commit_oid.to_short_oid(),
            commit.short_message()
        )?;

        Ok(())
    }
}
