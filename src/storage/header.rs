use crate::{
    storage::{DB_HEADER_SIZE, DB_VERSION, RASHDB_MAGIC, fixed_bytes::FixedBytesBuffer},
    types::{DEFAULT_PAGE_SIZE, error::DatabaseError},
};

/// The fixed 128-byte preamble at file offset 0. Multi-byte fields are
/// stored big-endian; everything past the page size is zero padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 16],
    pub version: u32,
    pub page_size: u16,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            magic: *RASHDB_MAGIC,
            version: DB_VERSION,
            page_size: DEFAULT_PAGE_SIZE as u16,
        }
    }
}

impl Header {
    pub fn to_bytes(&self) -> Result<Vec<u8>, DatabaseError> {
        let mut buf = FixedBytesBuffer::with_capacity(DB_HEADER_SIZE);

        // A zeroed magic or page size means "use the default"
        if self.magic[0] == 0 {
            buf.write(RASHDB_MAGIC)?;
        } else {
            buf.write(&self.magic)?;
        }
        buf.write(&self.version.to_be_bytes())?;
        if self.page_size == 0 {
            buf.write(&(DEFAULT_PAGE_SIZE as u16).to_be_bytes())?;
        } else {
            buf.write(&self.page_size.to_be_bytes())?;
        }

        Ok(buf.into_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatabaseError> {
        if bytes.len() < DB_HEADER_SIZE {
            return Err(DatabaseError::Truncated {
                what: "database header".to_string(),
            });
        }

        let mut magic = [0u8; 16];
        magic.copy_from_slice(&bytes[0..16]);
        if &magic != RASHDB_MAGIC {
            return Err(DatabaseError::InvalidDatabase {
                reason: "magic bytes do not match".to_string(),
            });
        }

        let version = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
        let page_size = u16::from_be_bytes([bytes[20], bytes[21]]);
        validate_page_size(page_size)?;

        Ok(Self {
            magic,
            version,
            page_size,
        })
    }
}

/// Page sizes are powers of two; 512 is the floor and the u16 field caps
/// the ceiling at 32768.
pub fn validate_page_size(page_size: u16) -> Result<(), DatabaseError> {
    if !page_size.is_power_of_two() || page_size < 512 {
        return Err(DatabaseError::InvalidDatabase {
            reason: format!("unsupported page size: {}", page_size),
        });
    }
    Ok(())
}
