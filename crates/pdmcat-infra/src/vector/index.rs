//! LanceDB-backed semantic index over tables and commented columns.
//!
//! Implements `SemanticIndex` from `pdmcat-core`. All documents live in one
//! table (the configured collection). Each row records the embedding model
//! that produced its vector; opening the index with a different embedder is
//! refused instead of mixing incompatible vectors.

use std::sync::Arc;

use arrow_array::{Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use arrow_schema::{DataType, Field};
use futures_util::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};

use pdmcat_core::index::embedder::Embedder;
use pdmcat_core::index::semantic::SemanticIndex;
use pdmcat_types::error::RepositoryError;
use pdmcat_types::index::{DocumentKind, IndexDocument, SearchHit};

use super::lance::LanceVectorStore;
use super::schema::{pdm_documents_schema, vector_dimension};

/// Semantic index stored in a single LanceDB table.
pub struct LanceSemanticIndex<E> {
    store: LanceVectorStore,
    table_name: String,
    embedder: E,
}

impl<E: Embedder> LanceSemanticIndex<E> {
    /// Open the index, verifying that stored vectors came from `embedder`.
    ///
    /// Fails with [`RepositoryError::Conflict`] when the collection holds
    /// vectors of another model or another width.
    pub async fn open(
        store: LanceVectorStore,
        table_name: impl Into<String>,
        embedder: E,
    ) -> Result<Self, RepositoryError> {
        let index = Self {
            store,
            table_name: table_name.into(),
            embedder,
        };
        index.check_embedder().await?;
        Ok(index)
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    async fn check_embedder(&self) -> Result<(), RepositoryError> {
        let Some(table) = self.existing_table().await? else {
            return Ok(());
        };

        let schema = table
            .schema()
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to read index schema: {e}")))?;
        let expected = self.embedder.dimension() as i32;
        if let Some(stored) = vector_dimension(&schema) {
            if stored != expected {
                return Err(RepositoryError::Conflict(format!(
                    "index '{}' holds {stored}-dimensional vectors, embedder produces {expected}",
                    self.table_name
                )));
            }
        }

        let model = self.embedder.model_name();
        let batches: Vec<RecordBatch> = table
            .query()
            .only_if(format!("embedding_model != {}", quote(model)))
            .limit(1)
            .execute()
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to check embedding model: {e}")))?
            .try_collect()
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to collect model check: {e}")))?;

        for batch in &batches {
            if batch.num_rows() == 0 {
                continue;
            }
            let stored = string_column(batch, "embedding_model")?.value(0).to_string();
            return Err(RepositoryError::Conflict(format!(
                "index '{}' was built with embedding model '{stored}', configured model is '{model}'",
                self.table_name
            )));
        }

        Ok(())
    }

    async fn existing_table(&self) -> Result<Option<lancedb::Table>, RepositoryError> {
        self.store
            .open_table(&self.table_name)
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to open index table: {e}")))
    }

    async fn ensure_table(&self) -> Result<lancedb::Table, RepositoryError> {
        let schema = Arc::new(pdm_documents_schema(self.embedder.dimension() as i32));
        self.store
            .ensure_table(&self.table_name, schema)
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to ensure index table: {e}")))
    }

    /// Build an Arrow RecordBatch from documents and their embeddings.
    fn build_record_batch(
        &self,
        docs: &[IndexDocument],
        embeddings: Vec<Vec<f32>>,
    ) -> Result<RecordBatch, RepositoryError> {
        let dimension = self.embedder.dimension();
        let schema = Arc::new(pdm_documents_schema(dimension as i32));

        let mut values = Vec::with_capacity(docs.len() * dimension);
        for (doc, embedding) in docs.iter().zip(embeddings) {
            if embedding.len() != dimension {
                return Err(RepositoryError::Query(format!(
                    "embedding for '{}' has {} dimensions, expected {dimension}",
                    doc.id,
                    embedding.len()
                )));
            }
            values.extend(embedding);
        }

        let id_array = StringArray::from_iter_values(docs.iter().map(|d| d.id.as_str()));
        let kind_array = StringArray::from_iter_values(docs.iter().map(|d| d.kind.as_str()));
        let name_array = StringArray::from_iter_values(docs.iter().map(|d| d.name.as_str()));
        let code_array = StringArray::from_iter_values(docs.iter().map(|d| d.code.as_str()));
        let file_array = StringArray::from_iter_values(docs.iter().map(|d| d.file.as_str()));
        let table_id_array: StringArray = docs.iter().map(|d| d.table_id.as_deref()).collect();
        let document_array = StringArray::from_iter_values(docs.iter().map(|d| d.text.as_str()));
        let model_array = StringArray::from_iter_values(
            std::iter::repeat(self.embedder.model_name()).take(docs.len()),
        );

        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let vector_array = FixedSizeListArray::new(
            field,
            dimension as i32,
            Arc::new(Float32Array::from(values)),
            None,
        );

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(id_array),
                Arc::new(kind_array),
                Arc::new(name_array),
                Arc::new(code_array),
                Arc::new(file_array),
                Arc::new(table_id_array),
                Arc::new(document_array),
                Arc::new(model_array),
                Arc::new(vector_array),
            ],
        )
        .map_err(|e| RepositoryError::Query(format!("Failed to build record batch: {e}")))
    }

    /// Parse search result rows into hits. The vector column is skipped.
    fn record_batch_to_hits(batch: &RecordBatch) -> Result<Vec<SearchHit>, RepositoryError> {
        let id_col = string_column(batch, "id")?;
        let kind_col = string_column(batch, "kind")?;
        let name_col = string_column(batch, "name")?;
        let code_col = string_column(batch, "code")?;
        let file_col = string_column(batch, "file")?;
        let table_id_col = string_column(batch, "table_id")?;
        let document_col = string_column(batch, "document")?;
        let distance_col = batch
            .column_by_name("_distance")
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

        let mut hits = Vec::with_capacity(batch.num_rows());
        for i in 0..batch.num_rows() {
            let kind: DocumentKind = kind_col
                .value(i)
                .parse()
                .map_err(|e: String| RepositoryError::Query(e))?;
            hits.push(SearchHit {
                id: id_col.value(i).to_string(),
                kind,
                name: name_col.value(i).to_string(),
                code: code_col.value(i).to_string(),
                file: file_col.value(i).to_string(),
                table_id: (!table_id_col.is_null(i)).then(|| table_id_col.value(i).to_string()),
                text: document_col.value(i).to_string(),
                distance: distance_col.map_or(0.0, |d| d.value(i)),
            });
        }
        Ok(hits)
    }
}

impl<E: Embedder> SemanticIndex for LanceSemanticIndex<E> {
    async fn upsert_documents(&self, docs: &[IndexDocument]) -> Result<usize, RepositoryError> {
        if docs.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = docs.iter().map(|d| d.text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != docs.len() {
            return Err(RepositoryError::Query(format!(
                "embedder returned {} vectors for {} documents",
                embeddings.len(),
                docs.len()
            )));
        }
        let batch = self.build_record_batch(docs, embeddings)?;

        let table = self.ensure_table().await?;
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        delete_ids(&table, &ids).await?;

        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to add documents: {e}")))?;

        tracing::debug!(count = docs.len(), table = %self.table_name, "index documents upserted");
        Ok(docs.len())
    }

    async fn query(
        &self,
        text: &str,
        top_k: usize,
        filter_kind: Option<DocumentKind>,
    ) -> Result<Vec<SearchHit>, RepositoryError> {
        if top_k == 0 || text.trim().is_empty() {
            return Ok(vec![]);
        }
        let Some(table) = self.existing_table().await? else {
            return Ok(vec![]);
        };
        let rows = table
            .count_rows(None)
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to count rows: {e}")))?;
        if rows == 0 {
            return Ok(vec![]);
        }

        let query_vector = self
            .embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::Query("embedder returned no query vector".to_string()))?;

        let mut search = table
            .vector_search(query_vector.as_slice())
            .map_err(|e| RepositoryError::Query(format!("Vector search setup failed: {e}")))?
            .distance_type(lancedb::DistanceType::Cosine)
            .limit(top_k);
        if let Some(kind) = filter_kind {
            search = search.only_if(format!("kind = {}", quote(kind.as_str())));
        }

        let batches: Vec<RecordBatch> = search
            .execute()
            .await
            .map_err(|e| RepositoryError::Query(format!("Vector search failed: {e}")))?
            .try_collect()
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to collect results: {e}")))?;

        let mut hits = Vec::new();
        for batch in &batches {
            hits.extend(Self::record_batch_to_hits(batch)?);
        }
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let Some(table) = self.existing_table().await? else {
            return Ok(0);
        };
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to count rows: {e}")))?;
        Ok(count as u64)
    }

    async fn delete_documents(&self, ids: &[String]) -> Result<(), RepositoryError> {
        if ids.is_empty() {
            return Ok(());
        }
        let Some(table) = self.existing_table().await? else {
            return Ok(());
        };
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        delete_ids(&table, &ids).await?;
        tracing::debug!(count = ids.len(), table = %self.table_name, "index documents deleted");
        Ok(())
    }
}

async fn delete_ids(table: &lancedb::Table, ids: &[&str]) -> Result<(), RepositoryError> {
    let list = ids.iter().map(|id| quote(id)).collect::<Vec<_>>().join(", ");
    table
        .delete(&format!("id IN ({list})"))
        .await
        .map_err(|e| RepositoryError::Query(format!("Failed to delete documents: {e}")))?;
    Ok(())
}

/// SQL string literal with single quotes doubled.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, RepositoryError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| RepositoryError::Query(format!("{name} column missing or not a string")))
}
