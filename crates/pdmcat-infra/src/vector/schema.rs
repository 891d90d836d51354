//! Arrow schema for the LanceDB semantic index table.
//!
//! Arrow versions MUST match lancedb's transitive dependency (57.3 for lancedb 0.26).

use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema};

/// BGESmallENV15 embedding dimension, shared by the lexical embedder.
pub const EMBEDDING_DIMENSION: i32 = 384;

/// Schema of the semantic index table (one row per table or commented column).
///
/// `table_id` is null for table documents.
pub fn pdm_documents_schema(dimension: i32) -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("kind", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("code", DataType::Utf8, false),
        Field::new("file", DataType::Utf8, false),
        Field::new("table_id", DataType::Utf8, true),
        Field::new("document", DataType::Utf8, false),
        Field::new("embedding_model", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dimension,
            ),
            false,
        ),
    ])
}

/// Vector width declared by a stored table schema, if it has a vector column.
pub fn vector_dimension(schema: &Schema) -> Option<i32> {
    match schema.field_with_name("vector").ok()?.data_type() {
        DataType::FixedSizeList(_, size) => Some(*size),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_schema_has_correct_fields() {
        let schema = pdm_documents_schema(EMBEDDING_DIMENSION);
        assert_eq!(schema.fields().len(), 9);
        assert!(schema.field_with_name("id").is_ok());
        assert!(schema.field_with_name("kind").is_ok());
        assert!(schema.field_with_name("document").is_ok());
        assert!(schema.field_with_name("table_id").unwrap().is_nullable());
        assert_eq!(vector_dimension(&schema), Some(EMBEDDING_DIMENSION));
    }

    #[test]
    fn test_vector_dimension_follows_argument() {
        let schema = pdm_documents_schema(8);
        assert_eq!(vector_dimension(&schema), Some(8));
        assert_eq!(vector_dimension(&Schema::empty()), None);
    }
}
