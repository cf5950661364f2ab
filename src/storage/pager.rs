use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
};

use crate::{
    storage::{DB_HEADER_SIZE, page::LeafPage},
    types::{
        NULL_PAGE_ID, SCHEMA_PAGE_ID, PageId,
        error::{DatabaseError, Result},
    },
};

/// Owns the open file and mediates all page-granularity I/O. Every read
/// hands out a [`PageHandle`] tagged with a unique request id; the in-use
/// index keeps a page from being recycled while any request on it is
/// outstanding.
pub struct Pager {
    page_size: usize,
    file: File,
    in_use: HashMap<PageId, HashSet<u64>>,
    // Request ids start at 1; 0 marks a handle that never came from a read
    next_req_id: u64,
    next_free_page_id: PageId,
}

/// A borrowed page image. `Issued` on request, `Released` after a write
/// or an explicit release; releasing twice is a no-op, writing a released
/// handle is an error.
pub struct PageHandle {
    pub id: PageId,
    pub page: LeafPage,
    req_id: u64,
    released: bool,
}

impl PageHandle {
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Pager {
    /// Wrap an open database file. The next free page id is derived from
    /// the current file length, so reopening a grown file keeps
    /// allocating past its last page.
    pub fn new(file: File, page_size: usize) -> Result<Self> {
        let file_size = file.metadata()?.len();
        let page_bytes = file_size.saturating_sub(DB_HEADER_SIZE as u64);
        let next_free_page_id = ((page_bytes / page_size as u64) as PageId + 1).max(2);

        Ok(Self {
            page_size,
            file,
            in_use: HashMap::new(),
            next_req_id: 1,
            next_free_page_id,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Read and decode one page, registering the borrow in the in-use
    /// index.
    pub fn request(&mut self, page_id: PageId) -> Result<PageHandle> {
        if page_id == NULL_PAGE_ID {
            return Err(DatabaseError::NullPage);
        }

        self.file.seek(SeekFrom::Start(self.page_start(page_id)))?;
        let mut buf = vec![0u8; self.page_size];
        self.file.read_exact(&mut buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                DatabaseError::Truncated {
                    what: format!("page {}", page_id),
                }
            } else {
                DatabaseError::Io(e)
            }
        })?;

        let page = LeafPage::from_bytes(&buf, self.page_size, page_id)
            .inspect_err(|e| tracing::warn!(page_id, error = %e, "page decode failed"))?;

        let req_id = self.next_req_id;
        self.next_req_id += 1;
        self.in_use.entry(page_id).or_default().insert(req_id);
        tracing::debug!(page_id, req_id, "page requested");

        Ok(PageHandle {
            id: page_id,
            page,
            req_id,
            released: false,
        })
    }

    /// Re-serialize a borrowed page to its slot and release the borrow.
    pub fn write(&mut self, handle: &mut PageHandle) -> Result<()> {
        if handle.released {
            return Err(DatabaseError::HandleReleased { page_id: handle.id });
        }
        self.write_page(handle.id, &handle.page)?;
        self.forget(handle.id, handle.req_id);
        handle.released = true;
        Ok(())
    }

    /// Write a page image that did not come from a read request, such as a
    /// freshly encoded table page.
    pub fn write_page(&mut self, page_id: PageId, page: &LeafPage) -> Result<()> {
        if page_id == NULL_PAGE_ID {
            return Err(DatabaseError::NullPage);
        }

        let bytes = page.to_bytes(self.page_size)?;
        self.file.seek(SeekFrom::Start(self.page_start(page_id)))?;
        let written = self.file.write(&bytes)?;
        if written != self.page_size {
            return Err(DatabaseError::ShortWrite {
                written,
                expected: self.page_size,
            });
        }
        tracing::debug!(page_id, "page written");
        Ok(())
    }

    /// Hand out the next free page id. Ids with outstanding borrows are
    /// skipped so a future free-list cannot recycle a page someone is
    /// still reading.
    pub fn allocate(&mut self) -> PageId {
        loop {
            let page_id = self.next_free_page_id;
            self.next_free_page_id += 1;
            if !self.is_borrowed(page_id) {
                tracing::debug!(page_id, "page allocated");
                return page_id;
            }
        }
    }

    /// Drop a borrow without writing. Safe to call on an already-released
    /// handle.
    pub fn release(&mut self, handle: &mut PageHandle) {
        if handle.released {
            return;
        }
        self.forget(handle.id, handle.req_id);
        handle.released = true;
    }

    /// Flush file contents to stable storage. This is the only durability
    /// point the engine offers.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    pub fn is_borrowed(&self, page_id: PageId) -> bool {
        self.in_use
            .get(&page_id)
            .is_some_and(|reqs| !reqs.is_empty())
    }

    fn forget(&mut self, page_id: PageId, req_id: u64) {
        if let Some(reqs) = self.in_use.get_mut(&page_id) {
            reqs.remove(&req_id);
            if reqs.is_empty() {
                self.in_use.remove(&page_id);
            }
        }
    }

    fn page_start(&self, page_id: PageId) -> u64 {
        debug_assert!(page_id >= SCHEMA_PAGE_ID, "page 0 checked by callers");
        DB_HEADER_SIZE as u64 + u64::from(page_id - 1) * self.page_size as u64
    }
}
