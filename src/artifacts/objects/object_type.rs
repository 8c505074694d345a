use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
}

const OBJECT_TYPES: phf::Map<&'static str, ObjectType> = phf::phf_map! {
    "blob" => ObjectType::Blob,
    "tree" => ObjectType::Tree,
    "commit" => ObjectType::Commit,
};

impl ObjectType {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
        }
    }

    /// Read the `<type> <size>\0` header, returning the type and declared payload size
    pub fn parse_header(data_reader: &mut impl BufRead) -> anyhow::Result<(ObjectType, usize)> {
        let mut object_type = Vec::new();
        data_reader.read_until(b' ', &mut object_type)?;
        if object_type.pop() != Some(b' ') {
            anyhow::bail!("missing object type terminator");
        }

        let object_type = String::from_utf8(object_type)?;
        let object_type = ObjectType::try_from(object_type.as_str())?;

        let mut size = Vec::new();
        data_reader.read_until(b'\0', &mut size)?;
        if size.pop() != Some(b'\0') {
            anyhow::bail!("missing object size terminator");
        }

        let size = std::str::from_utf8(&size)?.parse::<usize>()?;

        Ok((object_type, size))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        OBJECT_TYPES
            .get(value)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Invalid object type: {value}"))
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
