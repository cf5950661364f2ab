use crate::types::error::{DatabaseError, Result};

/// A fixed, preallocated buffer of bytes that cannot grow. Writes are best
/// effort: whatever fits is copied and the position advances, then the
/// overflowing request reports `OutOfCapacity`. On-disk regions have an
/// exact size, so [`into_bytes`](FixedBytesBuffer::into_bytes) hands back
/// the whole buffer, unwritten tail included.
pub struct FixedBytesBuffer {
    buf: Vec<u8>,
    pos: usize,
}

impl FixedBytesBuffer {
    pub fn new(buf: Vec<u8>) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(vec![0u8; capacity])
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let fits = bytes.len().min(self.remaining());
        self.buf[self.pos..self.pos + fits].copy_from_slice(&bytes[..fits]);
        self.pos += fits;
        if fits < bytes.len() {
            return Err(DatabaseError::OutOfCapacity {
                requested: bytes.len(),
                remaining: fits,
            });
        }
        Ok(())
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        if self.remaining() == 0 {
            return Err(DatabaseError::OutOfCapacity {
                requested: 1,
                remaining: 0,
            });
        }
        self.buf[self.pos] = byte;
        self.pos += 1;
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
