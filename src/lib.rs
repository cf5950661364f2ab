pub mod db;
pub mod storage;
pub mod types;

pub use db::Database;
pub use types::error::{DatabaseError, Result};
