//! Content digests
//!
//! The SHA-1 of an object's canonical bytes, kept as 40 lowercase hex digits. It is
//! the only identity of an object and its key in `.twig/objects/xx/yyyy...`.

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object::hash_bytes;
use std::io;
use std::path::PathBuf;

/// Object identifier (SHA-1 hash)
///
/// A 40-character lowercase hexadecimal string that uniquely identifies an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Accept 40 hex digits in either case; the id is kept lowercase
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        let is_hex40 = id.len() == OBJECT_ID_LENGTH && id.bytes().all(|b| b.is_ascii_hexdigit());
        if !is_hex40 {
            anyhow::bail!("'{id}' is not a 40-digit hexadecimal object id");
        }

        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Digest of the given canonical object bytes
    pub fn digest(content: &[u8]) -> Self {
        Self(hash_bytes(content))
    }

    /// Write the 20 raw digest bytes, as found in tree payloads and index entries
    pub fn write_h40_to<W: io::Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        let mut raw = [0u8; OBJECT_ID_LENGTH / 2];
        for (byte, pair) in raw.iter_mut().zip(self.0.as_bytes().chunks_exact(2)) {
            let pair = std::str::from_utf8(pair)?;
            *byte = u8::from_str_radix(pair, 16)?;
        }

        writer.write_all(&raw)?;
        Ok(())
    }

    /// Inverse of [`ObjectId::write_h40_to`]
    pub fn read_h40_from<R: io::Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut buffer = [0u8; OBJECT_ID_LENGTH / 2];
        reader.read_exact(&mut buffer)?;

        Ok(Self::from_raw(&buffer))
    }

    pub(crate) fn from_raw(bytes: &[u8; OBJECT_ID_LENGTH / 2]) -> Self {
        Self(bytes.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// `xx/yyyy...`, relative to the objects directory
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// First 7 characters of the hash
    pub fn to_short_oid(&self) -> String {
        self.0.get(..7).unwrap_or(&self.0).to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
