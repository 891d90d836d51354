//! Model extraction, store ports and ingestion orchestration for pdmcat.
//!
//! This crate defines the "ports" (catalog, semantic index and embedder
//! traits) that the infrastructure layer implements, plus everything that
//! needs no database: reading and extracting PowerDesigner documents,
//! building index documents, and driving files through both stores. It
//! depends only on `pdmcat-types` -- never on `pdmcat-infra` or any
//! database crate.

pub mod catalog;
pub mod index;
pub mod ingest;
pub mod pdm;
pub mod store;
