use crate::METADATA_DIR;
use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::objects::object_id::ObjectId;
use crate::config::{CONFIG_FILE_NAME, Config};
use crate::errors::TwigError;
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the staging index file inside the metadata directory
const INDEX_FILE_NAME: &str = "index";

/// Handle on a repository: every core operation goes through one
pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
    config: Config,
}

impl Repository {
    /// Handle rooted at `path`, which is created if needed; used before the repository exists
    pub fn new(path: &Path, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(path)
                .with_context(|| format!("Unable to create {}", path.display()))?;
        }

        let path = path
            .canonicalize()
            .with_context(|| format!("Unable to resolve {}", path.display()))?;
        let config = Config::load(&path.join(METADATA_DIR).join(CONFIG_FILE_NAME))?;

        let database = Database::new(path.join(METADATA_DIR).join("objects").into_boxed_path());
        let workspace = Workspace::new(path.clone().into_boxed_path());
        let refs = Refs::new(path.join(METADATA_DIR).into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            writer: RefCell::new(writer),
            database,
            workspace,
            refs,
            config,
        })
    }

    /// Handle on the repository containing `path`, searching its ancestors
    pub fn open(path: &Path, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        let start = path
            .canonicalize()
            .with_context(|| format!("Unable to resolve {}", path.display()))?;

        let root = start
            .ancestors()
            .find(|candidate| candidate.join(METADATA_DIR).is_dir())
            .ok_or_else(|| TwigError::NotARepository(start.clone()))?;

        tracing::trace!(root = %root.display(), "repository found");

        Self::new(root, writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.path.join(METADATA_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.metadata_path().join(CONFIG_FILE_NAME)
    }

    pub fn index_path(&self) -> PathBuf {
        self.metadata_path().join(INDEX_FILE_NAME)
    }

    pub fn is_initialized(&self) -> bool {
        self.refs.head_path().exists()
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Current staging index, read from disk
    pub fn load_index(&self) -> anyhow::Result<Index> {
        let mut index = Index::new(self.index_path().into_boxed_path());
        index.rehydrate()?;

        Ok(index)
    }

    /// Load the index, run `f` on it, and persist any modification
    ///
    /// Changes are flushed whether `f` succeeds or fails; `f`'s error wins over a
    /// failure to flush.
    pub fn update_index<T>(
        &self,
        f: impl FnOnce(&mut Index) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let mut index = self.load_index()?;

        let result = f(&mut index);
        let flushed = if index.is_changed() {
            index.write_updates()
        } else {
            Ok(())
        };

        let value = result?;
        flushed?;

        Ok(value)
    }

    /// Flattened tree of the current branch's tip, empty while it has no commits
    pub fn head_files(&self) -> anyhow::Result<BTreeMap<PathBuf, ObjectId>> {
        match self.refs.read_head()? {
            Some(head_oid) => self.database.commit_files(&head_oid),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Snapshot the next commit would record: HEAD's tree with the index laid over it
    pub fn staged_files(&self, index: &Index) -> anyhow::Result<BTreeMap<PathBuf, ObjectId>> {
        Ok(index.overlay(self.head_files()?))
    }
}
