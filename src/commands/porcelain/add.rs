use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::normalize_path;
use crate::errors::TwigError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

impl Repository {
    /// Stage every file under the given pathspecs, relative to the repository root
    ///
    /// File contents are stored as blobs first. Tracked files that no longer exist
    /// under a pathspec are staged for removal. A pathspec that matches nothing on
    /// disk and nothing tracked fails with `PathNotFound`. Returns the staged paths.
    #[tracing::instrument(skip(self))]
    pub fn stage_all(&self, pathspecs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
        let head_files = self.head_files()?;

        self.update_index(|index| {
            let mut staged = Vec::new();

            for pathspec in pathspecs {
                let prefix = normalize_path(pathspec)?;

                let staged_paths = index
                    .entries()
                    .filter(|entry| !entry.is_removal())
                    .map(|entry| &entry.name);
                let tracked = head_files
                    .keys()
                    .chain(staged_paths)
                    .filter(|path| path.starts_with(&prefix))
                    .cloned()
                    .collect::<BTreeSet<_>>();
                let files = if self.workspace().exists(&prefix) {
                    self.workspace().list_files(Some(&prefix))?
                } else {
                    Vec::new()
                };

                if files.is_empty() && tracked.is_empty() && !self.workspace().exists(&prefix) {
                    return Err(TwigError::PathNotFound(pathspec.clone()).into());
                }

                for path in tracked.iter().filter(|path| !self.workspace().is_file(path)) {
                    if head_files.contains_key(path) {
                        index.add_removal(path.clone());
                    } else {
                        index.remove(path);
                    }

                    tracing::debug!(path = %path.display(), "staged removal");
                    staged.push(path.clone());
                }

                for path in files {
                    let blob = self.workspace().parse_blob(&path)?;
                    let oid = self.database().store(&blob)?;

                    tracing::debug!(path = %path.display(), %oid, "staged file");
                    index.add(path.clone(), oid);
                    staged.push(path);
                }
            }

            Ok(staged)
        })
    }

    /// `add <paths...>`: pathspecs are resolved against the current directory
    pub fn add(&self, paths: &[PathBuf]) -> anyhow::Result<()> {
        let current_dir = std::env::current_dir()?;
        let pathspecs = paths
            .iter()
            .map(|path| self.relative_to_root(&current_dir, path))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let staged = self.stage_all(&pathspecs)?;
        tracing::info!(count = staged.len(), "paths staged");

        Ok(())
    }

    /// Express a path given relative to `base` as a path relative to the repository root
    pub(crate) fn relative_to_root(&self, base: &Path, path: &Path) -> anyhow::Result<PathBuf> {
        let base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
        let absolute = normalize_absolute(&base.join(path));

        absolute
            .strip_prefix(self.path())
            .map(Path::to_path_buf)
            .map_err(|_| TwigError::PathOutsideRepository(path.to_path_buf()).into())
    }
}

/// Resolve `.` and `..` in an absolute path without touching the file system
fn normalize_absolute(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }

    normalized
}
