//! Application state wiring both stores and the indexer together.
//!
//! The indexer is generic over the store traits; AppState pins it to the
//! SQLite catalog and the LanceDB index with a configured embedder.

use std::path::{Path, PathBuf};

use pdmcat_core::index::box_embedder::BoxEmbedder;
use pdmcat_core::ingest::Indexer;
use pdmcat_core::store::StoreHandle;
use pdmcat_infra::config::load_config;
use pdmcat_infra::sqlite::catalog::SqliteCatalogStore;
use pdmcat_infra::vector::embedder_for;
use pdmcat_infra::vector::index::LanceSemanticIndex;
use pdmcat_infra::vector::lance::LanceVectorStore;
use pdmcat_types::config::CatalogConfig;
use pdmcat_types::error::{RepositoryError, StoreKind};

pub type ConcreteIndex = LanceSemanticIndex<BoxEmbedder>;
pub type ConcreteIndexer = Indexer<SqliteCatalogStore, ConcreteIndex>;

/// Shared application state for every CLI command.
pub struct AppState {
    pub data_dir: PathBuf,
    pub config: CatalogConfig,
    pub indexer: ConcreteIndexer,
}

impl AppState {
    /// Load configuration and open both stores.
    ///
    /// A store that fails to open is kept as unavailable; only the commands
    /// that touch it fail.
    pub async fn init(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;
        let config = load_config(&data_dir).await;
        tracing::debug!(
            data_dir = %data_dir.display(),
            collection = %config.collection,
            model = %config.embedding_model,
            "opening stores"
        );

        let catalog = SqliteCatalogStore::open(&config.database_path(&data_dir)).await;
        let index = open_index(&config, &data_dir).await;

        let indexer = Indexer::new(
            StoreHandle::from_result(StoreKind::Catalog, catalog),
            StoreHandle::from_result(StoreKind::Index, index),
        )
        .with_extension(config.file_extension.clone());

        Ok(Self {
            data_dir,
            config,
            indexer,
        })
    }

    pub fn catalog(&self) -> anyhow::Result<&SqliteCatalogStore> {
        Ok(self.indexer.catalog().get()?)
    }

    pub fn index(&self) -> anyhow::Result<&ConcreteIndex> {
        Ok(self.indexer.index().get()?)
    }
}

async fn open_index(
    config: &CatalogConfig,
    data_dir: &Path,
) -> Result<ConcreteIndex, RepositoryError> {
    let embedder = embedder_for(&config.embedding_model, &data_dir.join("models")).await?;
    let store = LanceVectorStore::new(config.vector_store_path(data_dir))
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    LanceSemanticIndex::open(store, config.collection.clone(), embedder).await
}
