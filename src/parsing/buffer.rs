use std::fs;
use std::path::Path;
use tracing::debug;

/// Read a whole file into memory.
/// Returns None if the file can't be read or is empty, a missing corpus file
/// is an expected situation and not an error
pub fn load<P: AsRef<Path>>(path: P) -> Option<Vec<u8>> {
    let path = path.as_ref();

    match fs::read(path) {
        Ok(bytes) if !bytes.is_empty() => Some(bytes),
        Ok(_) => {
            debug!(path = %path.display(), "IDX file is empty");
            None
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "IDX file unavailable");
            None
        }
    }
}

/// Read the big-endian u32 header field number `field_index`
/// (the field starts at byte `field_index * 4`)
pub fn read_u32_be(buffer: &[u8], field_index: usize) -> Option<u32> {
    let mut cursor = ByteCursor::new(buffer);
    cursor.skip(field_index.checked_mul(4)?)?;
    cursor.read_u32_be()
}

/// A read position into a byte slice. Every read is bounds checked
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        ByteCursor { bytes, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Return the next `n` bytes and advance past them
    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.position.checked_add(n)?;
        let slice = self.bytes.get(self.position..end)?;
        self.position = end;

        Some(slice)
    }

    pub fn skip(&mut self, n: usize) -> Option<()> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    pub fn read_u32_be(&mut self) -> Option<u32> {
        let bytes: [u8; 4] = self.take(4)?.try_into().ok()?;
        Some(u32::from_be_bytes(bytes))
    }
}
