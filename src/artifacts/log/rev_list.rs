use crate::areas::database::Database;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;

/// Lazy walk over a commit and its first parents, child to root
///
/// Parents are always created before their children, so the chain is finite. A
/// commit that cannot be read is yielded as an error and ends the walk.
#[derive(Clone, new)]
pub struct RevList<'r> {
    database: &'r Database,
    current_commit_oid: Option<ObjectId>,
}

impl Iterator for RevList<'_> {
    type Item = anyhow::Result<(ObjectId, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        let commit_oid = self.current_commit_oid.take()?;

        match self.database.parse_object_as_commit(&commit_oid) {
            Ok(commit) => {
                // Move to the parent commit for the next iteration
                self.current_commit_oid = commit.parent().cloned();
                Some(Ok((commit_oid, commit)))
            }
            Err(error) => Some(Err(error)),
        }
    }
}
