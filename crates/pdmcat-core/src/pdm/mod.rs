//! PowerDesigner physical data model documents.
//!
//! `reader` loads, decodes and parses a `.pdm` file; `extract` maps the
//! parsed tree into typed schema records without touching any store.

pub mod encoding;
pub mod extract;
pub mod reader;

/// Namespace URI of `a:` attribute elements (`a:Name`, `a:Code`, ...).
pub const NS_ATTRIBUTE: &str = "attribute";

/// Namespace URI of `c:` collection elements (`c:Columns`, `c:ParentTable`, ...).
pub const NS_COLLECTION: &str = "collection";

/// Namespace URI of `o:` object elements (`o:Table`, `o:Column`, ...).
pub const NS_OBJECT: &str = "object";
