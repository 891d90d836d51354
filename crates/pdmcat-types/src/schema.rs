//! Schema entities extracted from PowerDesigner physical data models.
//!
//! Identifiers (`id`) are the model document's internal object ids
//! (`o1`, `o42`, ...); codes are the stable business identifiers shown to
//! users. Every field is always present: text that the document omits is an
//! empty string, never an `Option`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A source model file that has been ingested at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Surrogate key referenced by tables and references.
    pub id: i64,
    pub file_name: String,
    pub last_indexed: DateTime<Utc>,
}

/// A physical table and the columns it owns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    pub name: String,
    pub code: String,
    pub comment: String,
    pub columns: Vec<Column>,
}

/// A column belonging to exactly one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    /// Id of the owning [`Table`].
    pub table_id: String,
    pub name: String,
    pub code: String,
    pub comment: String,
    pub data_type: String,
    /// Length/precision qualifier, empty when the model gives none.
    pub length: String,
    pub mandatory: bool,
}

/// A directed foreign-key relationship: rows of the child table reference
/// rows of the parent table.
///
/// Endpoints are empty strings when the model has no pointer for them
/// (e.g. a reference to a table in another model).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    pub name: String,
    pub code: String,
    pub parent_table_id: String,
    pub child_table_id: String,
}

/// Everything extracted from one model document, staged before any store write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedModel {
    pub tables: Vec<Table>,
    pub references: Vec<Reference>,
}

impl ExtractedModel {
    /// Total number of columns across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }
}

/// One row of the table listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub code: String,
    pub name: String,
    pub comment: String,
}

impl TableSummary {
    /// The comment cut to at most `max_chars` characters, with an ellipsis
    /// appended when anything was cut.
    pub fn short_comment(&self, max_chars: usize) -> String {
        let mut chars = self.comment.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// A column as reported by a table schema lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub code: String,
    pub data_type: String,
    pub length: String,
    pub mandatory: bool,
    pub comment: String,
}

impl ColumnInfo {
    /// `VARCHAR(20)` when a length is present, otherwise just the type.
    pub fn type_display(&self) -> String {
        if self.length.is_empty() {
            self.data_type.clone()
        } else {
            format!("{}({})", self.data_type, self.length)
        }
    }
}

/// Full schema of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub id: String,
    pub code: String,
    pub name: String,
    pub comment: String,
    pub file_name: String,
    pub columns: Vec<ColumnInfo>,
}

/// Which end of a relationship the queried table sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipDirection {
    Parent,
    Child,
}

impl std::fmt::Display for RelationshipDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationshipDirection::Parent => write!(f, "parent"),
            RelationshipDirection::Child => write!(f, "child"),
        }
    }
}

/// A reference involving a queried table, joined back to both endpoint codes.
///
/// An endpoint code is `None` when the reference points at a table that is
/// not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub name: String,
    pub code: String,
    pub parent_code: Option<String>,
    pub child_code: Option<String>,
    pub direction: RelationshipDirection,
}

impl Relationship {
    /// Code of the table on the other end, relative to the queried table.
    pub fn other_code(&self) -> Option<&str> {
        match self.direction {
            RelationshipDirection::Parent => self.child_code.as_deref(),
            RelationshipDirection::Child => self.parent_code.as_deref(),
        }
    }
}

/// Row counts for the status dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCounts {
    pub files: u64,
    pub tables: u64,
    pub columns: u64,
    pub references: u64,
}
