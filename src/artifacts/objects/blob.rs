//! Blob object
//!
//! Blobs store file content. They contain only the raw file bytes, without any
//! metadata like file name or mode (those live in trees).
//!
//! ## Format
//!
//! On disk: `blob <size>\0<content>`

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use derive_new::new;
use std::io::BufRead;

/// Blob object representing file content
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Blob {
    content: Bytes,
}

impl Blob {
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }
}

impl Packable for Blob {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(self.content.clone())
    }
}

impl Unpackable for Blob {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        // the header has already been read
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;

        Ok(Self::new(Bytes::from(content)))
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn blob_id_matches_git_for_text_content() -> anyhow::Result<()> {
        let blob = Blob::new(Bytes::from_static(b"hi"));

        assert_eq!(
            blob.object_id()?.as_ref(),
            "32f95c0d1244a78b2be1bab8de17906fabb2c4a8"
        );

        Ok(())
    }

    #[test]
    fn binary_content_survives_deserialization() -> anyhow::Result<()> {
        let content = Bytes::from_static(&[0, 159, 146, 150, 255, 10]);
        let blob = Blob::deserialize(std::io::Cursor::new(content.clone()))?;

        assert_eq!(blob.content(), &content);

        Ok(())
    }

    proptest! {
        #[test]
        fn equal_content_yields_equal_ids(content in proptest::collection::vec(any::<u8>(), 0..256)) {
            let first = Blob::new(Bytes::from(content.clone())).object_id().unwrap();
            let second = Blob::new(Bytes::from(content)).object_id().unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn different_content_yields_different_ids(
            left in proptest::collection::vec(any::<u8>(), 0..64),
            right in proptest::collection::vec(any::<u8>(), 0..64)
        ) {
            prop_assume!(left != right);
            let left = Blob::new(Bytes::from(left)).object_id().unwrap();
            let right = Blob::new(Bytes::from(right)).object_id().unwrap();
            prop_assert_ne!(left, right);
        }
    }
}
