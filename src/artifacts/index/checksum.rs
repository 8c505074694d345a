use crate::artifacts::index::CHECKSUM_SIZE;
use anyhow::anyhow;
use bytes::Bytes;
use file_guard::FileGuard;
use sha1::{Digest, Sha1};
use std::io::{Read, Write};
use std::ops::DerefMut;

/// Reads or writes a locked index file while hashing every byte that goes through it
pub struct Checksum<'f> {
    file: FileGuard<&'f mut std::fs::File>,
    digest: Sha1,
}

impl<'f> Checksum<'f> {
    pub(crate) fn new(file: FileGuard<&'f mut std::fs::File>) -> Self {
        Checksum {
            file,
            digest: Sha1::new(),
        }
    }

    pub(crate) fn read(&mut self, size: usize) -> anyhow::Result<Bytes> {
        let mut buffer = vec![0; size];
        self.file
            .deref_mut()
            .read_exact(&mut buffer)
            .map_err(|_| anyhow!("Unexpected end-of-file while reading index"))?;

        self.digest.update(&buffer);
        Ok(Bytes::from(buffer))
    }

    pub(crate) fn write(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.file.deref_mut().write_all(data)?;
        self.digest.update(data);

        Ok(())
    }

    pub(crate) fn write_checksum(&mut self) -> anyhow::Result<()> {
        let checksum = self.digest.clone().finalize();
        self.file.deref_mut().write_all(checksum.as_slice())?;
        self.file.deref_mut().sync_all()?;

        Ok(())
    }

    /// Check the stored trailer against everything read so far, and that nothing follows it
    pub(crate) fn verify(&mut self) -> anyhow::Result<()> {
        let mut trailer = Vec::with_capacity(CHECKSUM_SIZE);
        self.file.deref_mut().read_to_end(&mut trailer)?;

        anyhow::ensure!(trailer.len() >= CHECKSUM_SIZE, "Missing checksum at end of index");
        anyhow::ensure!(
            trailer.len() == CHECKSUM_SIZE,
            "Unexpected data after index checksum"
        );
        anyhow::ensure!(
            trailer.as_slice() == self.digest.clone().finalize().as_slice(),
            "Checksum does not match value stored on disk"
        );

        Ok(())
    }
}
