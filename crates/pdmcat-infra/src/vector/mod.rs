//! Vector database infrastructure for the semantic index.
//!
//! Provides LanceDB vector store management, the `SemanticIndex`
//! implementation, and the fastembed and lexical embedders. The Arrow
//! schema defines the index table structure.

pub mod embedder;
pub mod index;
pub mod lance;
pub mod lexical;
pub mod schema;

use std::path::Path;

use pdmcat_core::index::box_embedder::BoxEmbedder;
use pdmcat_types::config::{DEFAULT_EMBEDDING_MODEL, LEXICAL_EMBEDDING_MODEL};
use pdmcat_types::error::RepositoryError;

use self::embedder::FastEmbedder;
use self::lexical::LexicalEmbedder;

/// Build the embedder named by `embedding_model`.
///
/// `"lexical"` selects [`LexicalEmbedder`]; any other value selects the
/// fastembed model, cached under `cache_dir`.
pub async fn embedder_for(
    embedding_model: &str,
    cache_dir: &Path,
) -> Result<BoxEmbedder, RepositoryError> {
    if embedding_model.eq_ignore_ascii_case(LEXICAL_EMBEDDING_MODEL) {
        return Ok(BoxEmbedder::new(LexicalEmbedder::new()));
    }
    if embedding_model != DEFAULT_EMBEDDING_MODEL {
        return Err(RepositoryError::Conflict(format!(
            "unsupported embedding model '{embedding_model}'"
        )));
    }
    Ok(BoxEmbedder::new(FastEmbedder::new(cache_dir.to_path_buf()).await?))
}
