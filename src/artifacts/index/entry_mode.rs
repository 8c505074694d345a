/// Mode recorded for a tree entry
///
/// Only regular files and directories are tracked.
#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd, Hash)]
pub enum EntryMode {
    #[default]
    File,
    Directory,
}

impl EntryMode {
    pub fn as_str(&self) -> &str {
        match self {
            EntryMode::File => "100644",
            EntryMode::Directory => "40000",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::File => 0o100644,
            EntryMode::Directory => 0o40000,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }

    pub fn from_octal_str(mode: &str) -> anyhow::Result<Self> {
        let mode = u32::from_str_radix(mode, 8)
            .map_err(|_| anyhow::anyhow!("Invalid entry mode: {mode}"))?;

        Self::try_from(mode)
    }
}

impl TryFrom<u32> for EntryMode {
    type Error = anyhow::Error;

    fn try_from(mode: u32) -> anyhow::Result<Self> {
        match mode {
            // Executable files are read back as regular files
            0o100644 | 0o100755 => Ok(EntryMode::File),
            0o40000 => Ok(EntryMode::Directory),
            _ => Err(anyhow::anyhow!("Invalid entry mode: {mode:o}")),
        }
    }
}
