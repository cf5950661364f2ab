use crate::{
    storage::{fixed_bytes::FixedBytesBuffer, varint},
    types::{
        PAGE_HEADER_SIZE, PageId,
        error::{DatabaseError, Result},
    },
};

pub const PAGE_TYPE_LEAF: u8 = 0x01;

/*
 * Leaf page layout on disk (page_size bytes total)
 * +------------------------------------------------------------------+
 * | 0x01 | num_cells (u16 BE) | reserved (5 bytes, zero)             |
 * +------------------------------------------------------------------+
 * | pointers[num_cells], u16 BE each                                 |
 * +------------------------------------------------------------------+
 * | cells, packed consecutively in index order                       |
 * +------------------------------------------------------------------+
 * | zero-filled free space                                           |
 * +------------------------------------------------------------------+
 *
 * pointers[i] is the offset of the first byte past the end of cell i,
 * relative to the page start. Cell 0 starts at 8 + 2*num_cells, so a
 * reader can size every cell from two adjacent pointers before touching
 * the varint inside it.
 */

/// One opaque payload within a page. It could be a whole row key or a row
/// value; the application layer decides. An `overflow_page_id` of 0 means
/// no overflow and the field is not written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub payload_len: u64,
    pub payload_initial: Vec<u8>,
    pub overflow_page_id: PageId,
}

impl Cell {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload_len: payload.len() as u64,
            payload_initial: payload,
            overflow_page_id: 0,
        }
    }

    /// In-page footprint: length varint + initial payload + the overflow
    /// pointer when present.
    pub fn disk_size(&self) -> usize {
        let overflow = if self.overflow_page_id != 0 { 4 } else { 0 };
        varint::byte_length(self.payload_len) + self.payload_initial.len() + overflow
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeafPage {
    pub num_cells: u16,
    pub pointers: Vec<u16>,
    pub cells: Vec<Cell>,
}

impl LeafPage {
    pub fn empty() -> Self {
        Self {
            num_cells: 0,
            pointers: Vec::new(),
            cells: Vec::new(),
        }
    }

    /// The largest cell count a page can hold: a key takes at least one
    /// varint byte plus a 2-byte slot, and its paired value at least the
    /// same again, so 6 bytes per key/value pair is the floor.
    pub fn max_cells(page_size: usize) -> usize {
        (page_size - PAGE_HEADER_SIZE) / 6
    }

    /// Byte offset where cell 0 begins.
    pub fn cells_start(num_cells: usize) -> usize {
        PAGE_HEADER_SIZE + 2 * num_cells
    }

    /// Assemble a page from packed cells, computing the pointer array.
    /// Pointers must stay strictly below the page size, so the running
    /// offset reaching it is already `PageOverflow`; splitting across
    /// pages is not implemented.
    pub fn from_cells(cells: Vec<Cell>, page_size: usize) -> Result<Self> {
        if cells.len() > Self::max_cells(page_size) {
            return Err(DatabaseError::PageOverflow {
                needed: Self::cells_start(cells.len()),
                page_size,
            });
        }

        let mut pointers = Vec::with_capacity(cells.len());
        let mut offset = Self::cells_start(cells.len());
        for cell in &cells {
            offset += cell.disk_size();
            if offset >= page_size {
                return Err(DatabaseError::PageOverflow {
                    needed: offset,
                    page_size,
                });
            }
            pointers.push(offset as u16);
        }

        Ok(Self {
            num_cells: cells.len() as u16,
            pointers,
            cells,
        })
    }

    pub fn to_bytes(&self, page_size: usize) -> Result<Vec<u8>> {
        let mut buf = FixedBytesBuffer::with_capacity(page_size);

        buf.write_byte(PAGE_TYPE_LEAF)?;
        buf.write(&self.num_cells.to_be_bytes())?;
        buf.write(&[0u8; 5])?;

        for ptr in &self.pointers {
            buf.write(&ptr.to_be_bytes())?;
        }

        for cell in &self.cells {
            buf.write(&varint::encode_u64(cell.payload_len))?;
            buf.write(&cell.payload_initial)?;
            if cell.overflow_page_id != 0 {
                buf.write(&cell.overflow_page_id.to_be_bytes())?;
            }
        }

        Ok(buf.into_bytes())
    }

    pub fn from_bytes(bytes: &[u8], page_size: usize, page_id: PageId) -> Result<Self> {
        if bytes.len() != page_size {
            return Err(DatabaseError::Truncated {
                what: format!("page {}", page_id),
            });
        }

        if bytes[0] != PAGE_TYPE_LEAF {
            return Err(DatabaseError::InvalidDatabase {
                reason: format!("unsupported page type byte: {:#04x}", bytes[0]),
            });
        }

        let num_cells = u16::from_be_bytes([bytes[1], bytes[2]]);
        let max = Self::max_cells(page_size);
        if usize::from(num_cells) > max {
            return Err(DatabaseError::PageCorruption {
                page_id,
                what: "cell count above page capacity".to_string(),
                expected: max as u64,
                got: u64::from(num_cells),
            });
        }
        // 5 reserved bytes sit between the count and the pointer array

        let cells_start = Self::cells_start(usize::from(num_cells));
        let mut pointers = Vec::with_capacity(usize::from(num_cells));
        let mut prev = cells_start as u16;
        for i in 0..usize::from(num_cells) {
            let at = PAGE_HEADER_SIZE + 2 * i;
            let ptr = u16::from_be_bytes([bytes[at], bytes[at + 1]]);
            if ptr < prev {
                return Err(DatabaseError::PageCorruption {
                    page_id,
                    what: "pointers must be non-decreasing".to_string(),
                    expected: u64::from(prev),
                    got: u64::from(ptr),
                });
            }
            if usize::from(ptr) >= page_size {
                return Err(DatabaseError::PageCorruption {
                    page_id,
                    what: "pointer at or beyond page size".to_string(),
                    expected: page_size as u64,
                    got: u64::from(ptr),
                });
            }
            pointers.push(ptr);
            prev = ptr;
        }

        let mut cells = Vec::with_capacity(usize::from(num_cells));
        let mut start = cells_start;
        for (i, ptr) in pointers.iter().enumerate() {
            let end = usize::from(*ptr);
            cells.push(Self::decode_cell(&bytes[start..end], page_id, i)?);
            start = end;
        }

        Ok(Self {
            num_cells,
            pointers,
            cells,
        })
    }

    fn decode_cell(cell_bytes: &[u8], page_id: PageId, index: usize) -> Result<Cell> {
        let cell_size = cell_bytes.len() as u64;
        let mut reader = cell_bytes;
        let payload_len = varint::decode(&mut reader)?;
        let varint_len = varint::byte_length(payload_len) as u64;

        // A payload length larger than the pointer gap means the cell
        // spills into an overflow page. Check before the equality test and
        // keep everything in u64: a hostile length must not truncate.
        if payload_len > cell_size.saturating_sub(varint_len) {
            return Err(DatabaseError::UnsupportedOverflow { payload_len });
        }
        if payload_len != cell_size - varint_len {
            return Err(DatabaseError::PageCorruption {
                page_id,
                what: format!("cell {} length does not match its pointer gap", index),
                expected: cell_size - varint_len,
                got: payload_len,
            });
        }

        let len = usize::try_from(payload_len).map_err(|_| DatabaseError::PageCorruption {
            page_id,
            what: format!("cell {} payload length overflows usize", index),
            expected: usize::MAX as u64,
            got: payload_len,
        })?;
        // A non-canonical varint can consume more bytes than byte_length
        // predicts, leaving the payload short of its declared length
        if reader.len() != len {
            return Err(DatabaseError::PageCorruption {
                page_id,
                what: format!("cell {} payload shorter than its declared length", index),
                expected: len as u64,
                got: reader.len() as u64,
            });
        }
        Ok(Cell {
            payload_len,
            payload_initial: reader.to_vec(),
            overflow_page_id: 0,
        })
    }
}
