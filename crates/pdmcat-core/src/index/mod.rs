//! Semantic index ports and document templates.
//!
//! The `SemanticIndex` and `Embedder` traits are implemented in pdmcat-infra
//! (LanceDB, fastembed). `document` holds the canonical text templates so
//! ingestion and any re-embedding share one definition.

pub mod box_embedder;
pub mod document;
pub mod embedder;
pub mod semantic;
