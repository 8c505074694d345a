use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object::{Packable, Unpackable};
use anyhow::anyhow;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexHeader {
    pub(crate) marker: String,
    pub(crate) version: u32,
    pub(crate) entries_count: u32,
}

impl IndexHeader {
    pub(crate) fn empty() -> Self {
        IndexHeader {
            marker: String::from(SIGNATURE),
            version: VERSION,
            entries_count: 0,
        }
    }

    /// Reject headers written by another tool or format version
    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        if self.marker != SIGNATURE {
            return Err(anyhow!("Invalid index file signature"));
        }

        if self.version != VERSION {
            return Err(anyhow!("Unsupported index file version: {}", self.version));
        }

        Ok(())
    }
}

impl Packable for IndexHeader {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        bytes.write_all(self.marker.as_bytes())?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.version)?;
        bytes.write_u32::<byteorder::NetworkEndian>(self.entries_count)?;

        Ok(Bytes::from(bytes))
    }
}

impl Unpackable for IndexHeader {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut bytes = [0u8; HEADER_SIZE];
        reader
            .read_exact(&mut bytes)
            .map_err(|_| anyhow!("Invalid header size"))?;

        let marker = String::from_utf8(bytes[0..4].to_vec())
            .map_err(|_| anyhow!("Invalid marker in index header"))?;
        let version = byteorder::NetworkEndian::read_u32(&bytes[4..8]);
        let entries_count = byteorder::NetworkEndian::read_u32(&bytes[8..12]);

        Ok(IndexHeader {
            marker,
            version,
            entries_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_is_twelve_bytes_and_reads_back() -> anyhow::Result<()> {
        let header = IndexHeader::new(SIGNATURE.to_string(), VERSION, 3);
        let bytes = header.serialize()?;

        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[0..4], b"TIDX");
        assert_eq!(IndexHeader::deserialize(Cursor::new(bytes))?, header);

        Ok(())
    }

    #[test]
    fn foreign_signature_fails_validation() -> anyhow::Result<()> {
        let header = IndexHeader::deserialize(Cursor::new(b"DIRC\0\0\0\x02\0\0\0\0".to_vec()))?;

        assert!(header.validate().is_err());
        assert!(IndexHeader::empty().validate().is_ok());

        Ok(())
    }
}
