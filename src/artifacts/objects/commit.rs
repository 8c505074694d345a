//! Commits and their signatures
//!
//! A commit names a root tree, its parents (none for the first commit on a branch),
//! who wrote it and when, and a message. The payload is a block of header lines
//! followed by a blank line and the message:
//!
//! ```text
//! tree <hex>
//! parent <hex>
//! author Jane Doe <jane@example.com> 1700000000 +0100
//! committer Jane Doe <jane@example.com> 1700000000 +0100
//!
//! Subject line
//! ```

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use crate::errors::TwigError;
use std::io::BufRead;

pub const AUTHOR_NAME_ENV: &str = "TWIG_AUTHOR_NAME";
pub const AUTHOR_EMAIL_ENV: &str = "TWIG_AUTHOR_EMAIL";
pub const AUTHOR_DATE_ENV: &str = "TWIG_AUTHOR_DATE";

/// Who made a commit, and when
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Author {
    /// Create a new author stamped with the current local time
    pub fn new(name: String, email: String) -> Self {
        Author {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    pub fn new_with_timestamp(
        name: String,
        email: String,
        timestamp: chrono::DateTime<chrono::FixedOffset>,
    ) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    /// Split an identity of the form `Name <email>`
    pub fn parse_identity(identity: &str) -> anyhow::Result<(String, String)> {
        let email_start = identity
            .find('<')
            .ok_or_else(|| anyhow::anyhow!("Invalid author identity '{identity}': missing '<'"))?;
        let email_end = identity
            .rfind('>')
            .filter(|end| *end > email_start)
            .ok_or_else(|| anyhow::anyhow!("Invalid author identity '{identity}': missing '>'"))?;

        let name = identity[..email_start].trim().to_string();
        let email = identity[email_start + 1..email_end].trim().to_string();
        Self::check_identity(&name, &email)?;

        Ok((name, email))
    }

    /// Refuse names and emails that would not survive a round trip through a
    /// signature line
    pub fn check_identity(name: &str, email: &str) -> anyhow::Result<()> {
        const RESERVED: [char; 4] = ['<', '>', '\n', '\r'];

        if name.trim().is_empty() {
            return Err(TwigError::InvalidAuthor("empty name".to_string()).into());
        }
        if let Some(field) = [("name", name), ("email", email)]
            .into_iter()
            .find_map(|(field, value)| value.contains(RESERVED).then_some(field))
        {
            return Err(TwigError::InvalidAuthor(format!(
                "{field} must not contain '<', '>' or line breaks"
            ))
            .into());
        }

        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        Self::check_identity(&self.name, &self.email)
    }

    /// Author date override from the environment
    ///
    /// Accepts RFC 2822 or `%Y-%m-%d %H:%M:%S %z`.
    pub fn timestamp_from_env() -> Option<chrono::DateTime<chrono::FixedOffset>> {
        std::env::var(AUTHOR_DATE_ENV).ok().and_then(|date_str| {
            chrono::DateTime::parse_from_rfc2822(&date_str)
                .or_else(|_| chrono::DateTime::parse_from_str(&date_str, "%Y-%m-%d %H:%M:%S %z"))
                .ok()
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// "Name <email@example.com>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// "Name <email> timestamp timezone", as stored in commit objects
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// "Mon Jan 1 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.timestamp
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.timestamp
    }
}

/// Parse a stored signature: `Name <email> <seconds> <+hhmm>`
impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut fields = value.rsplitn(3, ' ');
        let (Some(zone), Some(seconds), Some(identity)) =
            (fields.next(), fields.next(), fields.next())
        else {
            anyhow::bail!("Invalid signature '{value}'");
        };

        let (name, email) = Self::parse_identity(identity)?;
        let seconds = seconds
            .parse::<i64>()
            .with_context(|| format!("Invalid signature time '{seconds}'"))?;
        let offset = parse_utc_offset(zone)?;
        let timestamp = chrono::DateTime::from_timestamp(seconds, 0)
            .with_context(|| format!("Signature time out of range: {seconds}"))?
            .with_timezone(&offset);

        Ok(Author::new_with_timestamp(name, email, timestamp))
    }
}

/// `+hhmm` or `-hhmm`
fn parse_utc_offset(zone: &str) -> anyhow::Result<chrono::FixedOffset> {
    let invalid = || anyhow::anyhow!("Invalid signature timezone '{zone}'");

    let (sign, digits) = match zone.split_at_checked(1) {
        Some(("+", digits)) => (1, digits),
        Some(("-", digits)) => (-1, digits),
        _ => return Err(invalid()),
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let hours = digits[..2].parse::<i32>()?;
    let minutes = digits[2..].parse::<i32>()?;

    chrono::FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    parents: Vec<ObjectId>,
    tree_oid: ObjectId,
    author: Author,
    committer: Author,
    message: String,
}

impl Commit {
    pub fn new(
        parents: Vec<ObjectId>,
        tree_oid: ObjectId,
        author: Author,
        message: String,
    ) -> Self {
        Commit {
            parents,
            tree_oid,
            committer: author.clone(),
            author,
            message,
        }
    }

    /// First line of the commit message
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or_default().to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn committer(&self) -> &Author {
        &self.committer
    }

    /// Seconds since the Unix epoch
    pub fn timestamp(&self) -> i64 {
        self.author.timestamp().timestamp()
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut headers = format!("tree {}\n", self.tree_oid);
        for parent in &self.parents {
            headers.push_str(&format!("parent {parent}\n"));
        }
        headers.push_str(&format!("author {}\n", self.author.display()));
        headers.push_str(&format!("committer {}\n", self.committer.display()));

        Ok(Bytes::from(format!("{headers}\n{}", self.message)))
    }
}

impl Unpackable for Commit {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .context("Commit payload is not valid UTF-8")?;

        let (headers, message) = content
            .split_once("\n\n")
            .context("Invalid commit object: missing message separator")?;

        let mut tree_oid = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in headers.lines() {
            let (key, value) = line
                .split_once(' ')
                .with_context(|| format!("Invalid commit header '{line}'"))?;

            match key {
                "tree" if tree_oid.is_none() && parents.is_empty() => {
                    tree_oid = Some(ObjectId::try_parse(value.to_string())?);
                }
                "parent" if tree_oid.is_some() && author.is_none() => {
                    parents.push(ObjectId::try_parse(value.to_string())?);
                }
                "author" if tree_oid.is_some() && author.is_none() => {
                    author = Some(Author::try_from(value)?);
                }
                "committer" if author.is_some() && committer.is_none() => {
                    committer = Some(Author::try_from(value)?);
                }
                _ => anyhow::bail!("Unexpected commit header '{key}'"),
            }
        }

        Ok(Commit {
            parents,
            tree_oid: tree_oid.context("Invalid commit object: missing tree line")?,
            author: author.context("Invalid commit object: missing author line")?,
            committer: committer.context("Invalid commit object: missing committer line")?,
            message: message.to_string(),
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }
}
