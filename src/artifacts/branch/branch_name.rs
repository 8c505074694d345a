use crate::artifacts::branch::{INVALID_BRANCH_NAME_REGEX, REF_PREFIX};
use crate::errors::TwigError;
use anyhow::Context;
use std::path::PathBuf;

/// A validated branch name such as `master` or `feature/login`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: String) -> anyhow::Result<Self> {
        let re = regex::Regex::new(INVALID_BRANCH_NAME_REGEX)
            .with_context(|| format!("invalid branch name regex: {INVALID_BRANCH_NAME_REGEX}"))?;

        if name.is_empty() || name == "HEAD" || re.is_match(&name) {
            return Err(TwigError::InvalidBranchName(name).into());
        }

        Ok(Self(name))
    }

    /// Parse the target of a symbolic ref such as `refs/heads/master`
    pub fn try_parse_ref_path(ref_path: &str) -> anyhow::Result<Self> {
        let name = ref_path.strip_prefix(REF_PREFIX).ok_or_else(|| {
            TwigError::CorruptHead(format!(
                "symbolic ref must start with '{REF_PREFIX}', got '{ref_path}'"
            ))
        })?;

        Self::try_parse(name.to_string())
    }

    /// `refs/heads/<name>`, as stored in HEAD
    pub fn to_ref_path(&self) -> String {
        format!("{REF_PREFIX}{}", self.0)
    }

    /// Location of the ref file relative to the metadata directory
    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(self.to_ref_path())
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
