//! SQLite catalog store implementation.
//!
//! Every write of one model file goes through a single [`CatalogWriter`]
//! transaction: register the file, upsert every table, its columns and
//! every reference, then commit. Upserts overwrite rows in place keyed by
//! the document's identifiers, so re-ingesting a file never duplicates
//! rows and never detaches a column from its table.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use pdmcat_core::catalog::CatalogRepository;
use pdmcat_types::error::RepositoryError;
use pdmcat_types::schema::{
    CatalogCounts, Column, ColumnInfo, ExtractedModel, Reference, Relationship,
    RelationshipDirection, SourceFile, Table, TableSchema, TableSummary,
};
use sqlx::{Row, Sqlite, Transaction};

use super::pool::{DatabasePool, database_url};

/// SQLite-backed catalog of tables, columns and references.
pub struct SqliteCatalogStore {
    pool: DatabasePool,
}

impl SqliteCatalogStore {
    /// Create a catalog store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Open (creating and migrating if needed) the catalog file at `path`.
    pub async fn open(path: &Path) -> Result<Self, RepositoryError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::Query(format!("create {}: {e}", parent.display())))?;
        }
        let pool = DatabasePool::new(&database_url(path))
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Start a write transaction on the single writer connection.
    pub async fn begin(&self) -> Result<CatalogWriter, RepositoryError> {
        let tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(CatalogWriter { tx })
    }

    async fn table_id_for_code(&self, code: &str) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT id FROM tables WHERE code = ? ORDER BY id LIMIT 1")
            .bind(code)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.map(|r| r.try_get::<String, _>("id"))
            .transpose()
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }
}

/// One uncommitted catalog write.
///
/// Dropping a writer without calling [`CatalogWriter::commit`] rolls the
/// whole transaction back.
pub struct CatalogWriter {
    tx: Transaction<'static, Sqlite>,
}

impl CatalogWriter {
    /// Insert the file or refresh its `last_indexed`, returning its stable id.
    pub async fn register_file(&mut self, file_name: &str) -> Result<SourceFile, RepositoryError> {
        // Stored with microsecond precision; keep the returned value identical.
        let now = Utc::now().trunc_subsecs(6);
        let row = sqlx::query(
            r#"INSERT INTO pdm_files (file_name, last_indexed)
               VALUES (?, ?)
               ON CONFLICT (file_name) DO UPDATE SET
                   last_indexed = excluded.last_indexed
               RETURNING id"#,
        )
        .bind(file_name)
        .bind(format_datetime(&now))
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(SourceFile {
            id,
            file_name: file_name.to_string(),
            last_indexed: now,
        })
    }

    /// Insert or overwrite a table row owned by `file_id`.
    ///
    /// A table id already owned by another file is taken over; the previous
    /// owner is named in a warning.
    pub async fn upsert_table(&mut self, table: &Table, file_id: i64) -> Result<(), RepositoryError> {
        let owner = sqlx::query(
            r#"SELECT t.file_id, f.file_name FROM tables t
               JOIN pdm_files f ON f.id = t.file_id
               WHERE t.id = ?"#,
        )
        .bind(&table.id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if let Some(owner) = owner {
            let owner_id: i64 = owner
                .try_get("file_id")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            if owner_id != file_id {
                let owner_name: String = owner
                    .try_get("file_name")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                tracing::warn!(
                    table_id = %table.id,
                    code = %table.code,
                    previous_file = %owner_name,
                    "table id already defined by another file, overwriting"
                );
            }
        }

        sqlx::query(
            r#"INSERT INTO tables (id, file_id, name, code, comment)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT (id) DO UPDATE SET
                   file_id = excluded.file_id,
                   name = excluded.name,
                   code = excluded.code,
                   comment = excluded.comment"#,
        )
        .bind(&table.id)
        .bind(file_id)
        .bind(&table.name)
        .bind(&table.code)
        .bind(&table.comment)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    /// Insert or overwrite a column row; its table must already be staged.
    ///
    /// `position` is the column's index within its table in the document.
    pub async fn upsert_column(
        &mut self,
        column: &Column,
        position: i64,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO columns (id, table_id, name, code, comment, data_type, length, mandatory, position)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (id) DO UPDATE SET
                   table_id = excluded.table_id,
                   name = excluded.name,
                   code = excluded.code,
                   comment = excluded.comment,
                   data_type = excluded.data_type,
                   length = excluded.length,
                   mandatory = excluded.mandatory,
                   position = excluded.position"#,
        )
        .bind(&column.id)
        .bind(&column.table_id)
        .bind(&column.name)
        .bind(&column.code)
        .bind(&column.comment)
        .bind(&column.data_type)
        .bind(&column.length)
        .bind(if column.mandatory { 1i64 } else { 0i64 })
        .bind(position)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    /// Insert or overwrite a reference row owned by `file_id`.
    ///
    /// Endpoints are stored as given, resolved or not.
    pub async fn upsert_reference(
        &mut self,
        reference: &Reference,
        file_id: i64,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO references_rels (id, file_id, name, code, parent_table_id, child_table_id)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT (id) DO UPDATE SET
                   file_id = excluded.file_id,
                   name = excluded.name,
                   code = excluded.code,
                   parent_table_id = excluded.parent_table_id,
                   child_table_id = excluded.child_table_id"#,
        )
        .bind(&reference.id)
        .bind(file_id)
        .bind(&reference.name)
        .bind(&reference.code)
        .bind(&reference.parent_table_id)
        .bind(&reference.child_table_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    /// Make every staged row visible atomically.
    pub async fn commit(self) -> Result<(), RepositoryError> {
        self.tx
            .commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }
}

impl CatalogRepository for SqliteCatalogStore {
    async fn write_model(
        &self,
        file_name: &str,
        model: &ExtractedModel,
    ) -> Result<SourceFile, RepositoryError> {
        let mut writer = self.begin().await?;
        let file = writer.register_file(file_name).await?;

        for table in &model.tables {
            writer.upsert_table(table, file.id).await?;
            for (position, column) in table.columns.iter().enumerate() {
                writer.upsert_column(column, position as i64).await?;
            }
        }
        for reference in &model.references {
            writer.upsert_reference(reference, file.id).await?;
        }

        writer.commit().await?;
        tracing::debug!(
            file = %file_name,
            file_id = file.id,
            tables = model.tables.len(),
            references = model.references.len(),
            "catalog write committed"
        );
        Ok(file)
    }

    async fn list_tables(&self) -> Result<Vec<TableSummary>, RepositoryError> {
        let rows = sqlx::query("SELECT code, name, comment FROM tables ORDER BY code, id")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| -> Result<TableSummary, sqlx::Error> {
                Ok(TableSummary {
                    code: row.try_get("code")?,
                    name: row.try_get("name")?,
                    comment: row.try_get("comment")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }

    async fn get_table_schema(&self, code: &str) -> Result<Option<TableSchema>, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT t.id, t.code, t.name, t.comment, f.file_name
               FROM tables t
               JOIN pdm_files f ON f.id = t.file_id
               WHERE t.code = ?
               ORDER BY t.id
               LIMIT 1"#,
        )
        .bind(code)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let header = TableRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;

        let column_rows = sqlx::query(
            r#"SELECT name, code, data_type, length, mandatory, comment
               FROM columns WHERE table_id = ? ORDER BY position, rowid"#,
        )
        .bind(&header.id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut columns = Vec::with_capacity(column_rows.len());
        for row in &column_rows {
            columns.push(row_to_column_info(row).map_err(|e| RepositoryError::Query(e.to_string()))?);
        }

        Ok(Some(TableSchema {
            id: header.id,
            code: header.code,
            name: header.name,
            comment: header.comment,
            file_name: header.file_name,
            columns,
        }))
    }

    async fn find_relationships(
        &self,
        code: &str,
    ) -> Result<Option<Vec<Relationship>>, RepositoryError> {
        let Some(table_id) = self.table_id_for_code(code).await? else {
            return Ok(None);
        };

        let rows = sqlx::query(
            r#"SELECT r.name, r.code, r.parent_table_id,
                      p.code AS parent_code, c.code AS child_code
               FROM references_rels r
               LEFT JOIN tables p ON p.id = r.parent_table_id
               LEFT JOIN tables c ON c.id = r.child_table_id
               WHERE r.parent_table_id = ? OR r.child_table_id = ?
               ORDER BY r.code, r.id"#,
        )
        .bind(&table_id)
        .bind(&table_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut relationships = Vec::with_capacity(rows.len());
        for row in &rows {
            relationships.push(
                row_to_relationship(row, &table_id)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?,
            );
        }

        Ok(Some(relationships))
    }

    async fn list_files(&self) -> Result<Vec<SourceFile>, RepositoryError> {
        let rows = sqlx::query("SELECT id, file_name, last_indexed FROM pdm_files ORDER BY file_name")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut files = Vec::with_capacity(rows.len());
        for row in &rows {
            let last_indexed: String = row
                .try_get("last_indexed")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            files.push(SourceFile {
                id: row.try_get("id").map_err(|e| RepositoryError::Query(e.to_string()))?,
                file_name: row
                    .try_get("file_name")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?,
                last_indexed: parse_datetime(&last_indexed)?,
            });
        }

        Ok(files)
    }

    async fn counts(&self) -> Result<CatalogCounts, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT
                   (SELECT COUNT(*) FROM pdm_files) AS files,
                   (SELECT COUNT(*) FROM tables) AS tables,
                   (SELECT COUNT(*) FROM columns) AS columns,
                   (SELECT COUNT(*) FROM references_rels) AS refs"#,
        )
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count = |name: &str| -> Result<u64, RepositoryError> {
            row.try_get::<i64, _>(name)
                .map(|n| n as u64)
                .map_err(|e| RepositoryError::Query(e.to_string()))
        };

        Ok(CatalogCounts {
            files: count("files")?,
            tables: count("tables")?,
            columns: count("columns")?,
            references: count("refs")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Private Row types
// ---------------------------------------------------------------------------

struct TableRow {
    id: String,
    code: String,
    name: String,
    comment: String,
    file_name: String,
}

impl TableRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            comment: row.try_get("comment")?,
            file_name: row.try_get("file_name")?,
        })
    }
}

fn row_to_column_info(row: &sqlx::sqlite::SqliteRow) -> Result<ColumnInfo, sqlx::Error> {
    let mandatory: i64 = row.try_get("mandatory")?;
    Ok(ColumnInfo {
        name: row.try_get("name")?,
        code: row.try_get("code")?,
        data_type: row.try_get("data_type")?,
        length: row.try_get("length")?,
        mandatory: mandatory != 0,
        comment: row.try_get("comment")?,
    })
}

fn row_to_relationship(
    row: &sqlx::sqlite::SqliteRow,
    table_id: &str,
) -> Result<Relationship, sqlx::Error> {
    let parent_table_id: String = row.try_get("parent_table_id")?;
    let direction = if parent_table_id == table_id {
        RelationshipDirection::Parent
    } else {
        RelationshipDirection::Child
    };

    Ok(Relationship {
        name: row.try_get("name")?,
        code: row.try_get("code")?,
        parent_code: row.try_get("parent_code")?,
        child_code: row.try_get("child_code")?,
        direction,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}
