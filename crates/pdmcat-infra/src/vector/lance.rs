//! LanceDB connection for the semantic index.
//!
//! `LanceVectorStore` owns the connection; [`super::index`] builds the
//! document table on top of it.

use std::path::Path;
use std::sync::Arc;

use arrow_schema::Schema;

/// Embedded LanceDB database in one directory (`{data_dir}/vector_store`
/// by default).
pub struct LanceVectorStore {
    db: lancedb::Connection,
}

impl LanceVectorStore {
    /// Connect to the database at `dir`, creating the directory first.
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self, lancedb::Error> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| lancedb::Error::CreateDir {
                path: dir.display().to_string(),
                source: e,
            })?;

        let uri = dir.to_str().ok_or_else(|| lancedb::Error::InvalidInput {
            message: format!("vector store path is not UTF-8: {}", dir.display()),
        })?;
        let db = lancedb::connect(uri).execute().await?;
        Ok(Self { db })
    }

    /// The named table, created empty with `schema` when absent.
    pub async fn ensure_table(
        &self,
        name: &str,
        schema: Arc<Schema>,
    ) -> Result<lancedb::Table, lancedb::Error> {
        if let Some(table) = self.open_table(name).await? {
            return Ok(table);
        }
        tracing::debug!(table = name, "creating index table");
        self.db.create_empty_table(name, schema).execute().await
    }

    /// The named table, or `None` before the first write.
    pub async fn open_table(&self, name: &str) -> Result<Option<lancedb::Table>, lancedb::Error> {
        match self.db.open_table(name).execute().await {
            Ok(table) => Ok(Some(table)),
            Err(lancedb::Error::TableNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
