use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Result;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::{BufRead, Write};

pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

/// A stored object: its payload is what `serialize` produces
pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    /// Canonical bytes `<type> <size>\0<payload>`, hashed and stored as-is
    fn encode(&self) -> Result<Bytes> {
        let payload = self.serialize()?;

        let mut object_bytes = Vec::with_capacity(payload.len() + 32);
        let header = format!("{} {}\0", self.object_type().as_str(), payload.len());
        object_bytes.write_all(header.as_bytes())?;
        object_bytes.write_all(&payload)?;

        Ok(Bytes::from(object_bytes))
    }

    // TODO: Cache the encoded form and ID to avoid recomputing them for nested trees
    fn object_id(&self) -> Result<ObjectId> {
        Ok(ObjectId::digest(&self.encode()?))
    }
}

pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
}

impl ObjectBox {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectBox::Blob(_) => ObjectType::Blob,
            ObjectBox::Tree(_) => ObjectType::Tree,
            ObjectBox::Commit(_) => ObjectType::Commit,
        }
    }
}

/// Compute the digest of already encoded object bytes
pub(crate) fn hash_bytes(content: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(content);

    format!("{:x}", hasher.finalize())
}
