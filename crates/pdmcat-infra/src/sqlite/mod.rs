//! SQLite storage layer.
//!
//! The catalog store, backed by SQLite with WAL mode and split read/write
//! connection pools.

pub mod catalog;
pub mod pool;
