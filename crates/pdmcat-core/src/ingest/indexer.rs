//! Indexing orchestrator.
//!
//! Per file: `Discovered -> Registered -> Extracted -> CatalogWritten ->
//! IndexWritten -> Done`. The whole file is read and extracted before the
//! first store write, and the catalog write is a single committed unit, so
//! a failure leaves at most this file's index documents behind the catalog.
//! A failed file is logged and never stops a directory run.

use std::path::{Path, PathBuf};

use pdmcat_types::error::{IngestError, StoreKind};
use pdmcat_types::ingest::{FileOutcome, IngestReport, IngestStage};
use tracing::Instrument;

use crate::catalog::CatalogRepository;
use crate::index::document::{documents_for_tables, stale_column_ids};
use crate::index::semantic::SemanticIndex;
use crate::pdm::extract::extract_model;
use crate::pdm::reader::PdmSource;
use crate::store::StoreHandle;

/// Default extension of model files picked up by [`Indexer::index_all`].
pub const DEFAULT_EXTENSION: &str = "pdm";

/// Drives model files through both stores.
///
/// Owns its store handles; nothing is shared through process-wide state.
pub struct Indexer<C, I> {
    catalog: StoreHandle<C>,
    index: StoreHandle<I>,
    extension: String,
}

impl<C, I> Indexer<C, I>
where
    C: CatalogRepository,
    I: SemanticIndex,
{
    pub fn new(catalog: StoreHandle<C>, index: StoreHandle<I>) -> Self {
        Self {
            catalog,
            index,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Match a different file extension (without the dot) in `index_all`.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn catalog(&self) -> &StoreHandle<C> {
        &self.catalog
    }

    pub fn index(&self) -> &StoreHandle<I> {
        &self.index
    }

    /// Ingest one file and return its terminal outcome.
    ///
    /// Never returns early with an error: failures are recorded in the
    /// outcome together with the stage that failed.
    pub async fn index_file(&self, path: &Path) -> FileOutcome {
        let mut outcome = FileOutcome::new(path.to_path_buf());
        let span = tracing::info_span!("index_file", file = %outcome.file_name);

        async {
            tracing::info!(path = %path.display(), "indexing file");
            match self.run(path, &mut outcome).await {
                Ok(()) => tracing::info!(
                    tables = outcome.tables,
                    columns = outcome.columns,
                    references = outcome.references,
                    documents = outcome.documents,
                    "finished indexing"
                ),
                Err(err) => {
                    tracing::warn!(stage = %outcome.stage, error = %err, "indexing failed");
                    outcome.error = Some(err);
                }
            }
        }
        .instrument(span)
        .await;

        outcome
    }

    /// Ingest every matching file of `dir` in lexicographic order.
    ///
    /// Only a missing or unreadable directory is an error; per-file
    /// failures are reported in the returned [`IngestReport`].
    pub async fn index_all(&self, dir: &Path) -> Result<IngestReport, IngestError> {
        let mut report = IngestReport::new();
        let span = tracing::info_span!("index_all", run_id = %report.run_id, dir = %dir.display());

        async {
            let files = self.discover(dir).await?;
            tracing::info!(count = files.len(), "discovered model files");

            for path in files {
                let outcome = self.index_file(&path).await;
                report.outcomes.push(outcome);
            }

            let failed = report.failed().count();
            tracing::info!(
                succeeded = report.outcomes.len() - failed,
                failed,
                "indexing run complete"
            );
            Ok(())
        }
        .instrument(span)
        .await
        .map(|()| report)
    }

    async fn run(&self, path: &Path, outcome: &mut FileOutcome) -> Result<(), IngestError> {
        outcome.stage = IngestStage::Registered;
        let source = PdmSource::open(path).await?;
        let file_name = source.file_name();

        outcome.stage = IngestStage::Extracted;
        let model = {
            let tree = source.parse()?;
            extract_model(tree.root())
        };
        outcome.tables = model.tables.len();
        outcome.columns = model.column_count();
        outcome.references = model.references.len();

        outcome.stage = IngestStage::CatalogWritten;
        let file = self
            .catalog
            .get()?
            .write_model(&file_name, &model)
            .await
            .map_err(|e| IngestError::store_write(StoreKind::Catalog, e))?;
        tracing::debug!(file_id = file.id, "catalog committed");

        outcome.stage = IngestStage::IndexWritten;
        let index = self.index.get()?;
        let docs = documents_for_tables(&model.tables, &file_name);
        outcome.documents = index
            .upsert_documents(&docs)
            .await
            .map_err(|e| IngestError::store_write(StoreKind::Index, e))?;
        let stale = stale_column_ids(&model.tables);
        if !stale.is_empty() {
            index
                .delete_documents(&stale)
                .await
                .map_err(|e| IngestError::store_write(StoreKind::Index, e))?;
        }

        outcome.stage = IngestStage::Done;
        Ok(())
    }

    async fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
        let io_err = |err: std::io::Error| {
            if err.kind() == std::io::ErrorKind::NotFound {
                IngestError::NotFound(dir.to_path_buf())
            } else {
                IngestError::Io {
                    path: dir.to_path_buf(),
                    message: err.to_string(),
                }
            }
        };

        let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_file && self.matches_extension(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use pdmcat_types::error::RepositoryError;
    use pdmcat_types::index::{DocumentKind, IndexDocument, SearchHit};
    use pdmcat_types::schema::{
        CatalogCounts, ExtractedModel, Relationship, SourceFile, TableSchema, TableSummary,
    };

    // --- Mock stores ---

    #[derive(Default)]
    struct MockCatalog {
        files: Mutex<BTreeMap<String, i64>>,
        tables: Mutex<BTreeMap<String, String>>,
        fail: AtomicBool,
    }

    impl CatalogRepository for MockCatalog {
        async fn write_model(
            &self,
            file_name: &str,
            model: &ExtractedModel,
        ) -> Result<SourceFile, RepositoryError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(RepositoryError::Query("disk I/O error".to_string()));
            }
            let mut files = self.files.lock().unwrap();
            let next = files.len() as i64 + 1;
            let id = *files.entry(file_name.to_string()).or_insert(next);
            let mut tables = self.tables.lock().unwrap();
            for t in &model.tables {
                tables.insert(t.id.clone(), t.code.clone());
            }
            Ok(SourceFile {
                id,
                file_name: file_name.to_string(),
                last_indexed: chrono::Utc::now(),
            })
        }

        async fn list_tables(&self) -> Result<Vec<TableSummary>, RepositoryError> {
            Ok(vec![])
        }

        async fn get_table_schema(
            &self,
            _code: &str,
        ) -> Result<Option<TableSchema>, RepositoryError> {
            Ok(None)
        }

        async fn find_relationships(
            &self,
            _code: &str,
        ) -> Result<Option<Vec<Relationship>>, RepositoryError> {
            Ok(None)
        }

        async fn list_files(&self) -> Result<Vec<SourceFile>, RepositoryError> {
            Ok(vec![])
        }

        async fn counts(&self) -> Result<CatalogCounts, RepositoryError> {
            Ok(CatalogCounts {
                files: self.files.lock().unwrap().len() as u64,
                tables: self.tables.lock().unwrap().len() as u64,
                ..Default::default()
            })
        }
    }

    #[derive(Default)]
    struct MockIndex {
        docs: Mutex<BTreeMap<String, IndexDocument>>,
        fail: AtomicBool,
    }

    impl SemanticIndex for MockIndex {
        async fn upsert_documents(&self, docs: &[IndexDocument]) -> Result<usize, RepositoryError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(RepositoryError::Query("lance write rejected".to_string()));
            }
            let mut stored = self.docs.lock().unwrap();
            for doc in docs {
                stored.insert(doc.id.clone(), doc.clone());
            }
            Ok(docs.len())
        }

        async fn query(
            &self,
            _text: &str,
            _top_k: usize,
            _filter_kind: Option<DocumentKind>,
        ) -> Result<Vec<SearchHit>, RepositoryError> {
            Ok(vec![])
        }

        async fn count(&self) -> Result<u64, RepositoryError> {
            Ok(self.docs.lock().unwrap().len() as u64)
        }

        async fn delete_documents(&self, ids: &[String]) -> Result<(), RepositoryError> {
            let mut stored = self.docs.lock().unwrap();
            for id in ids {
                stored.remove(id);
            }
            Ok(())
        }
    }

    fn indexer() -> Indexer<MockCatalog, MockIndex> {
        Indexer::new(
            StoreHandle::Ready(MockCatalog::default()),
            StoreHandle::Ready(MockIndex::default()),
        )
    }

    fn ready<S>(handle: &StoreHandle<S>) -> &S {
        handle.get().unwrap()
    }

    const CRM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Model xmlns:a="attribute" xmlns:c="collection" xmlns:o="object">
<c:Tables>
  <o:Table Id="o1">
    <a:Name>Customer</a:Name>
    <a:Code>CUST</a:Code>
    <a:Comment>Customer master</a:Comment>
    <c:Columns>
      <o:Column Id="c1"><a:Code>CUST_ID</a:Code><a:Column.Mandatory>1</a:Column.Mandatory></o:Column>
      <o:Column Id="c2"><a:Code>NOTE</a:Code><a:Comment>Free text</a:Comment></o:Column>
    </c:Columns>
  </o:Table>
</c:Tables>
<c:References>
  <o:Reference Id="r1">
    <a:Code>FK_EXTERNAL</a:Code>
    <c:ChildTable><o:Table Ref="o1"/></c:ChildTable>
  </o:Reference>
</c:References>
</Model>"#;

    async fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        tokio::fs::write(&path, content).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_index_file_reaches_done() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "crm.pdm", CRM).await;
        let indexer = indexer();

        let outcome = indexer.index_file(&path).await;

        assert!(outcome.is_done(), "unexpected error: {:?}", outcome.error);
        assert_eq!(outcome.file_name, "crm.pdm");
        assert_eq!(outcome.tables, 1);
        assert_eq!(outcome.columns, 2);
        assert_eq!(outcome.references, 1);
        // Table document plus the one commented column.
        assert_eq!(outcome.documents, 2);
        assert_eq!(ready(indexer.index()).count().await.unwrap(), 2);
        assert_eq!(ready(indexer.catalog()).counts().await.unwrap().tables, 1);
    }

    #[tokio::test]
    async fn test_missing_file_fails_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = indexer();

        let outcome = indexer.index_file(&dir.path().join("nope.pdm")).await;

        assert_eq!(outcome.stage, IngestStage::Registered);
        assert!(matches!(outcome.error, Some(IngestError::NotFound(_))));
        assert_eq!(ready(indexer.catalog()).counts().await.unwrap().files, 0);
    }

    #[tokio::test]
    async fn test_malformed_file_fails_at_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.pdm", "<Model><unclosed></Model>").await;
        let indexer = indexer();

        let outcome = indexer.index_file(&path).await;

        assert_eq!(outcome.stage, IngestStage::Extracted);
        assert!(matches!(
            outcome.error,
            Some(IngestError::MalformedDocument { .. })
        ));
        assert_eq!(ready(indexer.catalog()).counts().await.unwrap().files, 0);
        assert_eq!(ready(indexer.index()).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_catalog_failure_skips_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "crm.pdm", CRM).await;
        let indexer = indexer();
        ready(indexer.catalog()).fail.store(true, Ordering::SeqCst);

        let outcome = indexer.index_file(&path).await;

        assert_eq!(outcome.stage, IngestStage::CatalogWritten);
        assert!(matches!(
            outcome.error,
            Some(IngestError::StoreWriteFailure {
                store: StoreKind::Catalog,
                ..
            })
        ));
        assert_eq!(ready(indexer.index()).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_index_failure_keeps_catalog_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "crm.pdm", CRM).await;
        let indexer = indexer();
        ready(indexer.index()).fail.store(true, Ordering::SeqCst);

        let outcome = indexer.index_file(&path).await;

        assert_eq!(outcome.stage, IngestStage::IndexWritten);
        assert!(matches!(
            outcome.error,
            Some(IngestError::StoreWriteFailure {
                store: StoreKind::Index,
                ..
            })
        ));
        assert_eq!(ready(indexer.catalog()).counts().await.unwrap().tables, 1);
    }

    #[tokio::test]
    async fn test_unavailable_index_reports_store_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "crm.pdm", CRM).await;
        let indexer: Indexer<MockCatalog, MockIndex> = Indexer::new(
            StoreHandle::Ready(MockCatalog::default()),
            StoreHandle::Unavailable {
                store: StoreKind::Index,
                reason: "vector store locked".to_string(),
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
    }

    #[tokio::test]
    async fn test_reingest_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "crm.pdm", CRM).await;
        let indexer = indexer();

        indexer.index_file(&path).await;
        let first = ready(indexer.catalog()).counts().await.unwrap();
        indexer.index_file(&path).await;
        let second = ready(indexer.catalog()).counts().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(ready(indexer.index()).count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reingest_drops_document_of_uncommented_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "crm.pdm", CRM).await;
        let indexer = indexer();

        assert!(indexer.index_file(&path).await.is_done());
        assert!(ready(indexer.index()).docs.lock().unwrap().contains_key("c2"));

        write(dir.path(), "crm.pdm", &CRM.replace("<a:Comment>Free text</a:Comment>", "")).await;
        let outcome = indexer.index_file(&path).await;

        assert!(outcome.is_done(), "unexpected error: {:?}", outcome.error);
        assert_eq!(outcome.documents, 1);
        let docs = ready(indexer.index()).docs.lock().unwrap();
        assert!(!docs.contains_key("c2"));
        assert!(docs.contains_key("o1"));
    }

    #[tokio::test]
    async fn test_index_all_continues_past_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b_good.pdm", CRM).await;
        write(dir.path(), "a_bad.PDM", "<Model>").await;
        write(dir.path(), "notes.txt", "not a model").await;
        tokio::fs::create_dir(dir.path().join("sub.pdm")).await.unwrap();
        let indexer = indexer();

        let report = indexer.index_all(dir.path()).await.unwrap();

        let names: Vec<&str> = report.outcomes.iter().map(|o| o.file_name.as_str()).collect();
        assert_eq!(names, vec!["a_bad.PDM", "b_good.pdm"]);
        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.succeeded().count(), 1);
        assert_eq!(report.succeeded().next().unwrap().file_name, "b_good.pdm");
    }

    #[tokio::test]
    async fn test_index_all_custom_extension() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "crm.xml", CRM).await;
        write(dir.path(), "crm.pdm", CRM).await;
        let indexer = indexer().with_extension(".xml");

        let report = indexer.index_all(dir.path()).await.unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].file_name, "crm.xml");
    }

    #[tokio::test]
    async fn test_index_all_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = indexer()
            .index_all(&dir.path().join("absent"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NotFound(_)));
    }
}
