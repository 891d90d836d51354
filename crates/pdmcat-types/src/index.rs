//! Semantic index document and search result types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of entity an index document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Table,
    Column,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Table => "table",
            DocumentKind::Column => "column",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(DocumentKind::Table),
            "column" => Ok(DocumentKind::Column),
            other => Err(format!("unknown document kind: '{other}'")),
        }
    }
}

/// One searchable document, keyed by the entity id it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub id: String,
    pub kind: DocumentKind,
    /// Canonical text body that gets embedded.
    pub text: String,
    pub name: String,
    pub code: String,
    /// Source file name the entity was ingested from.
    pub file: String,
    /// Owning table id; set for column documents only.
    pub table_id: Option<String>,
}

/// A document returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub kind: DocumentKind,
    pub name: String,
    pub code: String,
    pub file: String,
    pub table_id: Option<String>,
    pub text: String,
    /// Cosine distance to the query (smaller is closer).
    pub distance: f32,
}
