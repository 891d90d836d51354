//! Infrastructure layer for pdmcat.
//!
//! Contains implementations of the store traits defined in `pdmcat-core`:
//! the SQLite catalog, the LanceDB semantic index and its embedders, plus
//! configuration loading and data directory resolution.

pub mod config;
pub mod sqlite;
pub mod vector;
