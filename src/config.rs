//! Repository configuration
//!
//! Stored as TOML in `.twig/config.toml`. Every field is optional; a missing file
//! yields the defaults.
//!
//! ```toml
//! [core]
//! default_branch = "master"
//!
//! [user]
//! name = "Jane Doe"
//! email = "jane@example.com"
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_BRANCH: &str = "master";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub core: CoreConfig,
    pub user: UserConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Initial branch, and where HEAD falls back to when its branch is deleted
    pub default_branch: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            default_branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read config file {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Unable to parse config file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self).context("Unable to serialize config")?;

        std::fs::write(path, content)
            .with_context(|| format!("Unable to write config file {}", path.display()))
    }

    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.core.default_branch = branch.into();
        self
    }
}
