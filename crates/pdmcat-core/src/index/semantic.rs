//! Semantic index trait.
//!
//! One embedded, searchable document per table and per commented column.
//! Implementations (e.g., LanceDB) live in pdmcat-infra.

use pdmcat_types::error::RepositoryError;
use pdmcat_types::index::{DocumentKind, IndexDocument, SearchHit};
use pdmcat_types::schema::{Column, Table};

use super::document::{column_document, table_document};

/// Trait for the vector-indexed document store.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait SemanticIndex: Send + Sync {
    /// Embed and store documents, replacing any stored under the same ids.
    ///
    /// Returns the number of documents written.
    fn upsert_documents(
        &self,
        docs: &[IndexDocument],
    ) -> impl std::future::Future<Output = Result<usize, RepositoryError>> + Send;

    /// Up to `top_k` documents closest to `text`, closest first, optionally
    /// restricted to one kind. No match is an empty vector, not an error.
    fn query(
        &self,
        text: &str,
        top_k: usize,
        filter_kind: Option<DocumentKind>,
    ) -> impl std::future::Future<Output = Result<Vec<SearchHit>, RepositoryError>> + Send;

    /// Number of stored documents.
    fn count(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Remove the documents stored under `ids`. Unknown ids are ignored.
    fn delete_documents(
        &self,
        ids: &[String],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Store or replace the document for one table.
    fn upsert_table_document(
        &self,
        table: &Table,
        file: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send {
        async move {
            self.upsert_documents(&[table_document(table, file)])
                .await
                .map(|_| ())
        }
    }

    /// Store or replace the document for one column.
    ///
    /// Returns `false` without writing when the column has no comment.
    fn upsert_column_document(
        &self,
        column: &Column,
        table: &Table,
        file: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send {
        async move {
            match column_document(column, table, file) {
                Some(doc) => self.upsert_documents(&[doc]).await.map(|_| true),
                None => Ok(false),
            }
        }
    }
}
