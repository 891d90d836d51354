//! Configuration types for pdmcat.
//!
//! `CatalogConfig` represents the `config.toml` in the data directory that
//! controls where model files are read from, where both stores live, and
//! which embedding model the semantic index uses.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Model name of the default fastembed embedder.
pub const DEFAULT_EMBEDDING_MODEL: &str = "bge-small-en-v1.5";

/// Model name of the offline feature-hashing embedder.
pub const LEXICAL_EMBEDDING_MODEL: &str = "lexical";

/// Top-level configuration. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory scanned by `index` when no path is given.
    /// Relative paths resolve against the data directory.
    pub pdm_dir: PathBuf,

    /// SQLite catalog file, relative to the data directory unless absolute.
    pub database_file: PathBuf,

    /// LanceDB directory, relative to the data directory unless absolute.
    pub vector_store_dir: PathBuf,

    /// Name of the semantic index collection.
    pub collection: String,

    /// Embedding model used at both ingestion and query time.
    pub embedding_model: String,

    /// Extension (without dot) of model files picked up from a directory.
    pub file_extension: String,

    /// Number of results returned by a semantic search.
    pub search_top_k: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            pdm_dir: PathBuf::from("files"),
            database_file: PathBuf::from("metadata.db"),
            vector_store_dir: PathBuf::from("vector_store"),
            collection: "pdm_metadata".to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            file_extension: "pdm".to_string(),
            search_top_k: 5,
        }
    }
}

impl CatalogConfig {
    pub fn pdm_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.pdm_dir)
    }

    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.database_file)
    }

    pub fn vector_store_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.vector_store_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = CatalogConfig::default();
        assert_eq!(config.collection, "pdm_metadata");
        assert_eq!(config.embedding_model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(config.file_extension, "pdm");
        assert_eq!(config.search_top_k, 5);
    }

    #[test]
    fn test_deserialize_partial_uses_defaults() {
        let config: CatalogConfig = toml::from_str(
            r#"
embedding_model = "lexical"
search_top_k = 8
"#,
        )
        .unwrap();
        assert_eq!(config.embedding_model, LEXICAL_EMBEDDING_MODEL);
        assert_eq!(config.search_top_k, 8);
        assert_eq!(config.collection, "pdm_metadata");
        assert_eq!(config.database_file, PathBuf::from("metadata.db"));
    }

    #[test]
    fn test_paths_resolve_against_data_dir() {
        let config = CatalogConfig {
            pdm_dir: PathBuf::from("/srv/models"),
            ..Default::default()
        };
        let data_dir = Path::new("/home/u/.pdmcat");
        assert_eq!(config.pdm_dir(data_dir), PathBuf::from("/srv/models"));
        assert_eq!(
            config.database_path(data_dir),
            PathBuf::from("/home/u/.pdmcat/metadata.db")
        );
        assert_eq!(
            config.vector_store_path(data_dir),
            PathBuf::from("/home/u/.pdmcat/vector_store")
        );
    }
}
