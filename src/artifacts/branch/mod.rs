//! Branch names
//!
//! Branch names follow git's ref-name rules: no component may start with a dot, no
//! `..`, `//`, `@{` or trailing `.lock`, and no control or glob characters.

pub mod branch_name;

pub const INVALID_BRANCH_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|\/\/|^\/|\/$|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";

/// Prefix of branch refs relative to the metadata directory
pub const REF_PREFIX: &str = "refs/heads/";
