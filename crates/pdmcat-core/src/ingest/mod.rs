//! Ingestion orchestration.
//!
//! `Indexer` drives one file at a time through
//! reader -> extractor -> catalog -> semantic index.

pub mod indexer;

pub use indexer::Indexer;
