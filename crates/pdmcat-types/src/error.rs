use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two independently consistent backing stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Catalog,
    Index,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Catalog => write!(f, "catalog"),
            StoreKind::Index => write!(f, "semantic index"),
        }
    }
}

/// Errors raised while ingesting a model document.
///
/// Every variant is fatal for the file being ingested and never for the
/// batch it belongs to.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("malformed document {}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("{store} write failed: {message}")]
    StoreWriteFailure { store: StoreKind, message: String },

    #[error("{store} unavailable: {reason}")]
    StoreUnavailable { store: StoreKind, reason: String },
}

impl IngestError {
    /// Wrap a repository failure as a write failure against `store`.
    pub fn store_write(store: StoreKind, err: RepositoryError) -> Self {
        IngestError::StoreWriteFailure {
            store,
            message: err.to_string(),
        }
    }
}

/// Errors from repository operations (used by trait definitions in pdmcat-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("invalid config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_document_display() {
        let err = IngestError::MalformedDocument {
            path: PathBuf::from("files/broken.pdm"),
            reason: "unexpected end of stream".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed document files/broken.pdm: unexpected end of stream"
        );
    }

    #[test]
    fn test_store_write_wraps_repository_error() {
        let err = IngestError::store_write(
            StoreKind::Catalog,
            RepositoryError::Query("FOREIGN KEY constraint failed".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "catalog write failed: query error: FOREIGN KEY constraint failed"
        );
    }

    #[test]
    fn test_store_unavailable_display() {
        let err = IngestError::StoreUnavailable {
            store: StoreKind::Index,
            reason: "permission denied".to_string(),
        };
        assert!(err.to_string().starts_with("semantic index unavailable"));
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
