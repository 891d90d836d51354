//! Canonical index documents for tables and columns.

use pdmcat_types::index::{DocumentKind, IndexDocument};
use pdmcat_types::schema::{Column, Table};

/// Text embedded for a table.
pub fn table_text(table: &Table) -> String {
    format!(
        "Table: {} ({}). Comment: {}",
        table.name, table.code, table.comment
    )
}

/// Text embedded for a column, qualified by its table's display name.
pub fn column_text(column: &Column, table: &Table) -> String {
    format!(
        "Column in {}: {} ({}). Comment: {}",
        table.name, column.name, column.code, column.comment
    )
}

/// Index document for a table ingested from `file`.
pub fn table_document(table: &Table, file: &str) -> IndexDocument {
    IndexDocument {
        id: table.id.clone(),
        kind: DocumentKind::Table,
        text: table_text(table),
        name: table.name.clone(),
        code: table.code.clone(),
        file: file.to_string(),
        table_id: None,
    }
}

/// Index document for a column, or `None` when the column has no comment.
///
/// Uncommented columns add nothing a table document does not already say.
pub fn column_document(column: &Column, table: &Table, file: &str) -> Option<IndexDocument> {
    if column.comment.is_empty() {
        return None;
    }
    Some(IndexDocument {
        id: column.id.clone(),
        kind: DocumentKind::Column,
        text: column_text(column, table),
        name: column.name.clone(),
        code: column.code.clone(),
        file: file.to_string(),
        table_id: Some(table.id.clone()),
    })
}

/// All documents for the tables of one file: each table followed by its
/// commented columns.
pub fn documents_for_tables(tables: &[Table], file: &str) -> Vec<IndexDocument> {
    let mut docs = Vec::with_capacity(tables.len());
    for table in tables {
        docs.push(table_document(table, file));
        docs.extend(
            table
                .columns
                .iter()
                .filter_map(|c| column_document(c, table, file)),
        );
    }
    docs
}

/// Ids of the columns that get no document, so a document left over from
/// an earlier, commented version of the column can be removed.
pub fn stale_column_ids(tables: &[Table]) -> Vec<String> {
    tables
        .iter()
        .flat_map(|t| &t.columns)
        .filter(|c| c.comment.is_empty())
        .map(|c| c.id.clone())
        .collect()
}
