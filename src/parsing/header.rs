//! IDX header
//!
//! Image files start with four big-endian u32 fields (magic, count, rows,
//! columns), label files with two (magic, count).

use super::buffer::ByteCursor;
use crate::error::IdxError;

/// Magic number of an image file (unsigned byte data, 3 dimensions)
pub const IMAGE_MAGIC: u32 = 0x0000_0803;
/// Magic number of a label file (unsigned byte data, 1 dimension)
pub const LABEL_MAGIC: u32 = 0x0000_0801;

/// The two kinds of IDX file making up a corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Images,
    Labels,
}

impl FileKind {
    pub fn magic(&self) -> u32 {
        match self {
            FileKind::Images => IMAGE_MAGIC,
            FileKind::Labels => LABEL_MAGIC,
        }
    }

    /// Size of the header in bytes
    pub fn header_size(&self) -> usize {
        match self {
            FileKind::Images => 16,
            FileKind::Labels => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub kind: FileKind,
    pub magic: u32,
    pub count: u32,
    /// Always 0 for label files
    pub rows: u32,
    /// Always 0 for label files
    pub columns: u32,
}

impl Header {
    /// Parse and check the header at the start of `bytes`
    pub fn parse(bytes: &[u8], kind: FileKind) -> Result<Header, IdxError> {
        let truncated = IdxError::Truncated {
            expected: kind.header_size(),
            actual: bytes.len(),
        };
        let mut cursor = ByteCursor::new(bytes);
        let magic = cursor.read_u32_be().ok_or(truncated.clone())?;

        if magic != kind.magic() {
            return Err(IdxError::MagicMismatch {
                expected: kind.magic(),
                actual: magic,
            });
        }

        let count = cursor.read_u32_be().ok_or(truncated.clone())?;
        let (rows, columns) = match kind {
            FileKind::Images => (
                cursor.read_u32_be().ok_or(truncated.clone())?,
                cursor.read_u32_be().ok_or(truncated)?,
            ),
            FileKind::Labels => (0, 0),
        };

        if kind == FileKind::Images && count > 0 && (rows == 0 || columns == 0) {
            return Err(IdxError::EmptyRecords {
                count,
                rows,
                columns,
            });
        }

        Ok(Header {
            kind,
            magic,
            count,
            rows,
            columns,
        })
    }

    /// Number of bytes in one record
    pub fn record_size(&self) -> usize {
        match self.kind {
            FileKind::Images => self.rows as usize * self.columns as usize,
            FileKind::Labels => 1,
        }
    }

    pub fn header_size(&self) -> usize {
        self.kind.header_size()
    }

    /// Check that a buffer of `len` bytes holds every record the header declares
    pub fn validate_length(&self, len: usize) -> Result<(), IdxError> {
        let expected = (self.count as usize)
            .checked_mul(self.record_size())
            .and_then(|body| body.checked_add(self.header_size()))
            .unwrap_or(usize::MAX);

        if expected > len {
            return Err(IdxError::Truncated {
                expected,
                actual: len,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(fields: &[u32]) -> Vec<u8> {
        fields.iter().flat_map(|f| f.to_be_bytes()).collect()
    }

    #[test]
    fn test_parse_image_header() {
        let bytes = header_bytes(&[IMAGE_MAGIC, 3, 28, 27]);
        let header = Header::parse(&bytes, FileKind::Images).unwrap();

        assert_eq!(header.count, 3);
        assert_eq!(header.rows, 28);
        assert_eq!(header.columns, 27);
        assert_eq!(header.record_size(), 28 * 27);
        assert_eq!(header.header_size(), 16);
    }

    #[test]
    fn test_parse_label_header() {
        let bytes = header_bytes(&[LABEL_MAGIC, 10_000]);
        let header = Header::parse(&bytes, FileKind::Labels).unwrap();

        assert_eq!(header.count, 10_000);
        assert_eq!((header.rows, header.columns), (0, 0));
        assert_eq!(header.record_size(), 1);
    }

    #[test]
    fn test_magic_mismatch() {
        let bytes = header_bytes(&[LABEL_MAGIC, 1, 1, 1]);

        assert_eq!(
            Header::parse(&bytes, FileKind::Images),
            Err(IdxError::MagicMismatch {
                expected: IMAGE_MAGIC,
                actual: LABEL_MAGIC
            })
        );
    }

    #[test]
    fn test_short_header() {
        let bytes = header_bytes(&[IMAGE_MAGIC, 1, 28]);

        assert_eq!(
            Header::parse(&bytes, FileKind::Images),
            Err(IdxError::Truncated {
                expected: 16,
                actual: 12
            })
        );
    }

    #[test]
    fn test_zero_sized_images() {
        let bytes = header_bytes(&[IMAGE_MAGIC, u32::MAX, 0, 28]);

        assert_eq!(
            Header::parse(&bytes, FileKind::Images),
            Err(IdxError::EmptyRecords {
                count: u32::MAX,
                rows: 0,
                columns: 28
            })
        );

        let empty = header_bytes(&[IMAGE_MAGIC, 0, 0, 0]);
        assert_eq!(Header::parse(&empty, FileKind::Images).unwrap().count, 0);
    }

    #[test]
    fn test_validate_length() {
        let bytes = header_bytes(&[IMAGE_MAGIC, 2, 2, 2]);
        let header = Header::parse(&bytes, FileKind::Images).unwrap();

        assert!(header.validate_length(16 + 8).is_ok());
        assert_eq!(
            header.validate_length(16 + 7),
            Err(IdxError::Truncated {
                expected: 24,
                actual: 23
            })
        );
    }
}
