//! End-to-end ingestion with the real SQLite catalog, the LanceDB index
//! and the lexical embedder.

use std::path::Path;

use pdmcat_core::catalog::CatalogRepository;
use pdmcat_core::index::semantic::SemanticIndex;
use pdmcat_core::ingest::Indexer;
use pdmcat_core::store::StoreHandle;
use pdmcat_infra::sqlite::catalog::SqliteCatalogStore;
use pdmcat_infra::vector::index::LanceSemanticIndex;
use pdmcat_infra::vector::lance::LanceVectorStore;
use pdmcat_infra::vector::lexical::LexicalEmbedder;
use pdmcat_types::error::{IngestError, StoreKind};
use pdmcat_types::index::DocumentKind;
use pdmcat_types::ingest::IngestStage;
use pdmcat_types::schema::RelationshipDirection;

type TestIndexer = Indexer<SqliteCatalogStore, LanceSemanticIndex<LexicalEmbedder>>;

const CRM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<?PowerDesigner AppLocale="UTF16" Code="CRM" Target="ORACLE 12c"?>
<Model xmlns:a="attribute" xmlns:c="collection" xmlns:o="object">
<o:RootObject Id="o0">
<c:Children>
<o:Model Id="o100">
<a:Name>CRM</a:Name>
<c:Tables>
  <o:Table Id="o1">
    <a:Name>Customer</a:Name>
    <a:Code>CUST</a:Code>
    <a:Comment>Customer master</a:Comment>
    <c:Columns>
      <o:Column Id="c1">
        <a:Name>Customer id</a:Name>
        <a:Code>CUST_ID</a:Code>
        <a:DataType>INTEGER</a:DataType>
        <a:Column.Mandatory>1</a:Column.Mandatory>
      </o:Column>
      <o:Column Id="c2">
        <a:Name>Note</a:Name>
        <a:Code>NOTE</a:Code>
        <a:Comment>Free text</a:Comment>
        <a:DataType>VARCHAR</a:DataType>
        <a:Length>200</a:Length>
      </o:Column>
    </c:Columns>
  </o:Table>
  <o:Table Id="o2">
    <a:Name>Order</a:Name>
    <a:Code>ORD</a:Code>
    <a:Comment>Sales orders</a:Comment>
    <c:Columns>
      <o:Column Id="c3">
        <a:Name>Order number</a:Name>
        <a:Code>ORD_NO</a:Code>
        <a:DataType>INTEGER</a:DataType>
      </o:Column>
    </c:Columns>
  </o:Table>
</c:Tables>
<c:References>
  <o:Reference Id="r1">
    <a:Name>Order customer</a:Name>
    <a:Code>FK_ORD_CUST</a:Code>
    <c:ParentTable><o:Table Ref="o1"/></c:ParentTable>
    <c:ChildTable><o:Table Ref="o2"/></c:ChildTable>
  </o:Reference>
  <o:Reference Id="r2">
    <a:Name>External</a:Name>
    <a:Code>FK_EXTERNAL</a:Code>
    <c:ChildTable><o:Table Ref="o1"/></c:ChildTable>
  </o:Reference>
</c:References>
</o:Model>
</c:Children>
</o:RootObject>
</Model>"#;

const WAREHOUSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Model xmlns:a="attribute" xmlns:c="collection" xmlns:o="object">
<c:Tables>
  <o:Table Id="w1">
    <a:Name>Stock</a:Name>
    <a:Code>STK</a:Code>
    <a:Comment>Inventory on hand</a:Comment>
  </o:Table>
</c:Tables>
</Model>"#;

async fn indexer(data_dir: &Path) -> TestIndexer {
    let catalog = SqliteCatalogStore::open(&data_dir.join("metadata.db")).await;
    let index = match LanceVectorStore::new(data_dir.join("vector_store")).await {
        Ok(store) => LanceSemanticIndex::open(store, "pdm_metadata", LexicalEmbedder::new()).await,
        Err(e) => panic!("vector store: {e}"),
    };
    Indexer::new(
        StoreHandle::from_result(StoreKind::Catalog, catalog),
        StoreHandle::from_result(StoreKind::Index, index),
    )
}

async fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    tokio::fs::create_dir_all(dir).await.unwrap();
    let path = dir.join(name);
    tokio::fs::write(&path, content).await.unwrap();
    path
}

#[tokio::test]
async fn crm_model_is_searchable_and_navigable() {
    let data = tempfile::tempdir().unwrap();
    let path = write(&data.path().join("files"), "crm.pdm", CRM).await;
    let indexer = indexer(data.path()).await;

    let outcome = indexer.index_file(&path).await;
    assert!(outcome.is_done(), "unexpected error: {:?}", outcome.error);
    assert_eq!(outcome.tables, 2);
    assert_eq!(outcome.columns, 3);
    assert_eq!(outcome.references, 2);
    // Two tables plus the only commented column.
    assert_eq!(outcome.documents, 3);

    let catalog = indexer.catalog().get().unwrap();
    let schema = catalog.get_table_schema("CUST").await.unwrap().unwrap();
    assert_eq!(schema.name, "Customer");
    assert_eq!(schema.file_name, "crm.pdm");
    assert_eq!(schema.columns.len(), 2);
    assert!(schema.columns[0].mandatory);
    assert_eq!(schema.columns[1].type_display(), "VARCHAR(200)");

    let rels = catalog.find_relationships("CUST").await.unwrap().unwrap();
    assert_eq!(rels.len(), 2);
    let fk = rels.iter().find(|r| r.code == "FK_ORD_CUST").unwrap();
    assert_eq!(fk.direction, RelationshipDirection::Parent);
    assert_eq!(fk.other_code(), Some("ORD"));
    let external = rels.iter().find(|r| r.code == "FK_EXTERNAL").unwrap();
    assert_eq!(external.direction, RelationshipDirection::Child);
    assert_eq!(external.parent_code, None);

    let index = indexer.index().get().unwrap();
    let hits = index
        .query("customer", 5, Some(DocumentKind::Table))
        .await
        .unwrap();
    assert_eq!(hits[0].code, "CUST");
    assert!(hits.iter().all(|h| h.kind == DocumentKind::Table));
}

#[tokio::test]
async fn reingesting_a_file_changes_nothing_but_the_timestamp() {
    let data = tempfile::tempdir().unwrap();
    let path = write(&data.path().join("files"), "crm.pdm", CRM).await;
    let indexer = indexer(data.path()).await;
    let catalog = indexer.catalog().get().unwrap();
    let index = indexer.index().get().unwrap();

    assert!(indexer.index_file(&path).await.is_done());
    let counts = catalog.counts().await.unwrap();
    let documents = index.count().await.unwrap();
    let first = catalog.list_files().await.unwrap().remove(0);

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    assert!(indexer.index_file(&path).await.is_done());
    let second = catalog.list_files().await.unwrap().remove(0);

    assert_eq!(catalog.counts().await.unwrap(), counts);
    assert_eq!(index.count().await.unwrap(), documents);
    assert_eq!(first.id, second.id);
    assert!(second.last_indexed > first.last_indexed);
}

#[tokio::test]
async fn column_without_comment_drops_out_of_search_on_reingest() {
    let data = tempfile::tempdir().unwrap();
    let files = data.path().join("files");
    let path = write(&files, "crm.pdm", CRM).await;
    let indexer = indexer(data.path()).await;
    let index = indexer.index().get().unwrap();

    assert!(indexer.index_file(&path).await.is_done());
    let hits = index
        .query("free text", 5, Some(DocumentKind::Column))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "c2");

    let uncommented = CRM.replace("<a:Comment>Free text</a:Comment>", "");
    write(&files, "crm.pdm", &uncommented).await;
    let outcome = indexer.index_file(&path).await;
    assert!(outcome.is_done(), "unexpected error: {:?}", outcome.error);

    let hits = index
        .query("free text", 5, Some(DocumentKind::Column))
        .await
        .unwrap();
    assert!(hits.is_empty());
    assert_eq!(index.count().await.unwrap(), 2);

    let schema = indexer
        .catalog()
        .get()
        .unwrap()
        .get_table_schema("CUST")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(schema.columns[1].comment, "");
}

#[tokio::test]
async fn batch_run_survives_a_malformed_file() {
    let data = tempfile::tempdir().unwrap();
    let files = data.path().join("files");
    write(&files, "a_broken.pdm", "<Model><c:Tables>").await;
    write(&files, "b_crm.pdm", CRM).await;
    write(&files, "c_warehouse.pdm", WAREHOUSE).await;
    write(&files, "readme.txt", "not a model").await;
    let indexer = indexer(data.path()).await;

    let report = indexer.index_all(&files).await.unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.outcomes[0].file_name, "a_broken.pdm");
    assert_eq!(report.outcomes[0].stage, IngestStage::Extracted);
    assert!(matches!(
        report.outcomes[0].error,
        Some(IngestError::MalformedDocument { .. })
    ));
    assert_eq!(report.succeeded().count(), 2);

    let catalog = indexer.catalog().get().unwrap();
    let codes: Vec<String> = catalog
        .list_tables()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.code)
        .collect();
    assert_eq!(codes, vec!["CUST", "ORD", "STK"]);
    let names: Vec<String> = catalog
        .list_files()
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.file_name)
        .collect();
    assert_eq!(names, vec!["b_crm.pdm", "c_warehouse.pdm"]);
}

#[tokio::test]
async fn unavailable_index_still_commits_catalog() {
    let data = tempfile::tempdir().unwrap();
    let path = write(&data.path().join("files"), "crm.pdm", CRM).await;
    let catalog = SqliteCatalogStore::open(&data.path().join("metadata.db"))
        .await
        .unwrap();
    let indexer: TestIndexer = Indexer::new(
        StoreHandle::Ready(catalog),
        StoreHandle::Unavailable {
            store: StoreKind::Index,
            reason: "vector store directory is read-only".to_string(),
        },
    );

    let outcome = indexer.index_file(&path).await;

    assert_eq!(outcome.stage, IngestStage::IndexWritten);
    assert!(matches!(
        outcome.error,
        Some(IngestError::StoreUnavailable {
            store: StoreKind::Index,
            ..
        })
    ));
    let catalog = indexer.catalog().get().unwrap();
    assert_eq!(catalog.counts().await.unwrap().tables, 2);
}
