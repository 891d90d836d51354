//! FastEmbed-based local embedding generator.
//!
//! Implements the `Embedder` trait from `pdmcat-core` using fastembed's
//! BGESmallENV15 model (384 dimensions) with ONNX runtime inference.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use pdmcat_core::index::embedder::Embedder;
use pdmcat_types::config::DEFAULT_EMBEDDING_MODEL;
use pdmcat_types::error::RepositoryError;

use super::schema::EMBEDDING_DIMENSION;

/// Local BGE-small embedder.
///
/// Inference is CPU-bound and runs on the blocking thread pool; the model
/// is shared behind a mutex because a session runs one batch at a time.
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
}

impl FastEmbedder {
    /// Load the model, downloading it into `cache_dir` on first use.
    pub async fn new(cache_dir: PathBuf) -> Result<Self, RepositoryError> {
        let model = tokio::task::spawn_blocking(move || {
            TextEmbedding::try_new(
                InitOptions::new(EmbeddingModel::BGESmallENV15)
                    .with_cache_dir(cache_dir)
                    .with_show_download_progress(false),
            )
        })
        .await
        .map_err(|e| RepositoryError::Query(format!("embedding model task failed: {e}")))?
        .map_err(|e| RepositoryError::Query(format!("failed to load embedding model: {e}")))?;

        tracing::debug!(model = DEFAULT_EMBEDDING_MODEL, "embedding model loaded");
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

impl Embedder for FastEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RepositoryError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| RepositoryError::Query("embedding model lock poisoned".to_string()))?;
            model
                .embed(texts, None)
                .map_err(|e| RepositoryError::Query(format!("embedding failed: {e}")))
        })
        .await
        .map_err(|e| RepositoryError::Query(format!("embedding task failed: {e}")))?
    }

    fn model_name(&self) -> &str {
        DEFAULT_EMBEDDING_MODEL
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION as usize
    }
}
