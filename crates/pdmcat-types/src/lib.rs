//! Shared domain types for pdmcat.
//!
//! This crate contains the schema entities extracted from PowerDesigner
//! models (Table, Column, Reference, SourceFile), the read models handed to
//! catalog consumers, ingestion outcomes, configuration, and error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod schema;
