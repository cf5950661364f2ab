pub mod error;
pub mod row;
pub mod value;

// Common type aliases
pub type PageId = u32;

// Page 0 is the null sentinel, page 1 always holds the schema table
pub const NULL_PAGE_ID: PageId = 0;
pub const SCHEMA_PAGE_ID: PageId = 1;

pub const DEFAULT_PAGE_SIZE: usize = 4096;
pub const PAGE_HEADER_SIZE: usize = 8; // page_type(1) + num_cells(2) + reserved(5)
