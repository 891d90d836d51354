//! Catalog repository trait.
//!
//! The normalized relational store of extracted entities. Implementations
//! (e.g., SQLite) live in pdmcat-infra.

use pdmcat_types::error::RepositoryError;
use pdmcat_types::schema::{
    CatalogCounts, ExtractedModel, Relationship, SourceFile, TableSchema, TableSummary,
};

/// Trait for catalog persistence and the consumer-facing lookups.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait CatalogRepository: Send + Sync {
    /// Register `file_name` and insert-or-replace every table, column and
    /// reference of `model` as one committed unit.
    ///
    /// On error nothing of this call is visible and the previously committed
    /// state of the file is intact.
    fn write_model(
        &self,
        file_name: &str,
        model: &ExtractedModel,
    ) -> impl std::future::Future<Output = Result<SourceFile, RepositoryError>> + Send;

    /// All tables (code, name, comment), ordered by code.
    fn list_tables(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<TableSummary>, RepositoryError>> + Send;

    /// One table and its columns by code; `None` when no table has that code.
    fn get_table_schema(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<Option<TableSchema>, RepositoryError>> + Send;

    /// References where the table with `code` is parent or child.
    ///
    /// `None` when no table has that code; an empty vector when it has no
    /// relationships.
    fn find_relationships(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<Relationship>>, RepositoryError>> + Send;

    /// All ingested source files, ordered by name.
    fn list_files(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<SourceFile>, RepositoryError>> + Send;

    /// Row counts per entity collection.
    fn counts(
        &self,
    ) -> impl std::future::Future<Output = Result<CatalogCounts, RepositoryError>> + Send;
}
