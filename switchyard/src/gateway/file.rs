use crate::codec::{read_bool, read_bytes, write_bool, write_bytes};
use crate::error::Result;
use std::io::{Read, Write};

/// Metadata carried alongside a passed file descriptor/handle.
pub struct FileMeta {
    pub name: String,
    pub extra: bool,
}

impl FileMeta {
    pub fn serialize<W: Write>(&self, w: &mut W) -> Result<()> {
        write_bytes(w, self.name.as_bytes())?;
        write_bool(w, self.extra)?;
        Ok(())
    }

    pub fn deserialize<R: Read>(r: &mut R, max_len: u32) -> Result<FileMeta> {
        let name_bytes = read_bytes(r, max_len)?;
        let name = String::from_utf8_lossy(&name_bytes).into_owned();
        let extra = read_bool(r)?;
        Ok(FileMeta { name, extra })
    }
}
