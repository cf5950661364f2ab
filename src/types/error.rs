use thiserror::Error;

use crate::types::PageId;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid database: {reason}")]
    InvalidDatabase { reason: String },

    #[error("Page corruption: page_id={page_id}, {what} (expected {expected}, got {got})")]
    PageCorruption {
        page_id: PageId,
        what: String,
        expected: u64,
        got: u64,
    },

    #[error("Truncated input while reading {what}")]
    Truncated { what: String },

    #[error("Buffer out of capacity: {requested} bytes requested, {remaining} remaining")]
    OutOfCapacity { requested: usize, remaining: usize },

    #[error("Rows do not fit on a single page: {needed} bytes needed, page holds {page_size}")]
    PageOverflow { needed: usize, page_size: usize },

    #[error("Short write: wrote {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("Pager: page 0 is the null page")]
    NullPage,

    #[error("Pager: page handle already released (page_id: {page_id})")]
    HandleReleased { page_id: PageId },

    #[error("Column '{0}' not found in row")]
    MissingColumn(String),

    #[error("Column '{name}' not found in table '{table}'")]
    ColumnNotFound { name: String, table: String },

    #[error("Table '{0}' not found")]
    UnknownTable(String),

    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Table '{0}' has no primary key")]
    MissingPrimaryKey(String),

    #[error("Invalid schema for table '{table}': {reason}")]
    InvalidSchema { table: String, reason: String },

    #[error("Type mismatch for column '{column}': expected {expected}, got {got}")]
    TypeMismatch {
        column: String,
        expected: String,
        got: String,
    },

    #[error("Trailing garbage: {len} undecoded bytes after row values")]
    Garbage { len: usize },

    #[error("Overflow pages not implemented (payload of {payload_len} bytes exceeds its cell)")]
    UnsupportedOverflow { payload_len: u64 },

    #[error("Negative value {0} cannot be encoded as a varint")]
    NegativeInput(i64),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
