//! Schema extractor: maps a parsed model tree into typed records.
//!
//! Extraction never fails on a document that parsed. Missing attribute
//! elements are normal in PowerDesigner exports and become empty strings.
//!
//! Shapes handled:
//!
//! ```xml
//! <o:Table Id="o10">
//!   <a:Name>Customer</a:Name>
//!   <a:Code>CUST</a:Code>
//!   <a:Comment>Customer master</a:Comment>
//!   <c:Columns>
//!     <o:Column Id="o11">
//!       <a:Name>Customer id</a:Name>
//!       <a:Code>CUST_ID</a:Code>
//!       <a:DataType>VARCHAR(20)</a:DataType>
//!       <a:Length>20</a:Length>
//!       <a:Column.Mandatory>1</a:Column.Mandatory>
//!     </o:Column>
//!   </c:Columns>
//! </o:Table>
//!
//! <o:Reference Id="o30">
//!   <a:Name>FK_ORDER_CUST</a:Name>
//!   <c:ParentTable><o:Table Ref="o10"/></c:ParentTable>
//!   <c:ChildTable><o:Table Ref="o20"/></c:ChildTable>
//! </o:Reference>
//! ```

use pdmcat_types::schema::{Column, ExtractedModel, Reference, Table};
use roxmltree::Node;

use super::{NS_ATTRIBUTE, NS_COLLECTION, NS_OBJECT};

/// Extract every table (with its columns) in document order.
///
/// Only `o:Table` elements with a non-empty `Id` are tables; pointer
/// elements such as `<o:Table Ref="o10"/>` are skipped.
pub fn extract_tables(root: Node<'_, '_>) -> Vec<Table> {
    let tables: Vec<Table> = root
        .descendants()
        .filter(|n| is_element(*n, NS_OBJECT, "Table"))
        .filter_map(|n| object_id(n).map(|id| (id, n)))
        .map(|(id, node)| table_from_node(id, node))
        .collect();

    tracing::debug!(count = tables.len(), "extracted tables");
    tables
}

/// Extract every reference in document order.
///
/// Endpoint ids are read from the `Ref` attribute of the nested table
/// pointers and are not checked against the extracted tables.
pub fn extract_references(root: Node<'_, '_>) -> Vec<Reference> {
    let references: Vec<Reference> = root
        .descendants()
        .filter(|n| is_element(*n, NS_OBJECT, "Reference"))
        .filter_map(|n| object_id(n).map(|id| (id, n)))
        .map(|(id, node)| Reference {
            id: id.to_string(),
            name: attribute_text(node, "Name"),
            code: attribute_text(node, "Code"),
            parent_table_id: table_pointer(node, "ParentTable"),
            child_table_id: table_pointer(node, "ChildTable"),
        })
        .collect();

    tracing::debug!(count = references.len(), "extracted references");
    references
}

/// Extract tables and references in one pass over the document.
pub fn extract_model(root: Node<'_, '_>) -> ExtractedModel {
    ExtractedModel {
        tables: extract_tables(root),
        references: extract_references(root),
    }
}

fn table_from_node(id: &str, node: Node<'_, '_>) -> Table {
    // Only the table's own column collection; nested objects elsewhere in
    // the subtree (e.g. shortcuts) must not contribute columns.
    let columns = children(node, NS_COLLECTION, "Columns")
        .flat_map(|collection| children(collection, NS_OBJECT, "Column"))
        .filter_map(|col| object_id(col).map(|col_id| column_from_node(id, col_id, col)))
        .collect();

    Table {
        id: id.to_string(),
        name: attribute_text(node, "Name"),
        code: attribute_text(node, "Code"),
        comment: attribute_text(node, "Comment"),
        columns,
    }
}

fn column_from_node(table_id: &str, id: &str, node: Node<'_, '_>) -> Column {
    Column {
        id: id.to_string(),
        table_id: table_id.to_string(),
        name: attribute_text(node, "Name"),
        code: attribute_text(node, "Code"),
        comment: attribute_text(node, "Comment"),
        data_type: attribute_text(node, "DataType"),
        length: attribute_text(node, "Length"),
        mandatory: attribute_text(node, "Column.Mandatory") == "1",
    }
}

/// `Ref` of the `o:Table` pointer under `c:{collection}`, or `""`.
fn table_pointer(node: Node<'_, '_>, collection: &str) -> String {
    children(node, NS_COLLECTION, collection)
        .flat_map(|c| children(c, NS_OBJECT, "Table"))
        .find_map(|t| t.attribute("Ref"))
        .map(|r| r.trim().to_string())
        .unwrap_or_default()
}

/// Trimmed text of the direct `a:{name}` child, or `""`.
fn attribute_text(node: Node<'_, '_>, name: &str) -> String {
    children(node, NS_ATTRIBUTE, name)
        .next()
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

fn object_id<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.attribute("Id").filter(|id| !id.trim().is_empty())
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    namespace: &'a str,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| is_element(*n, namespace, name))
}

fn is_element(node: Node<'_, '_>, namespace: &str, name: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(namespace)
        && node.tag_name().name() == name
}
