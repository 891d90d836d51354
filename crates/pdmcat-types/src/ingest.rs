//! Ingestion stages and per-file / per-run outcomes.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

use crate::error::IngestError;

/// Progress of one file through the ingestion pipeline.
///
/// A file that fails keeps the stage it was working towards, so the stage
/// of a failed outcome tells which step broke: `Registered` (file missing
/// or unreadable), `Extracted` (malformed markup), `CatalogWritten`
/// (catalog write) or `IndexWritten` (index write).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStage {
    Discovered,
    Registered,
    Extracted,
    CatalogWritten,
    IndexWritten,
    Done,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IngestStage::Discovered => "discovered",
            IngestStage::Registered => "registered",
            IngestStage::Extracted => "extracted",
            IngestStage::CatalogWritten => "catalog_written",
            IngestStage::IndexWritten => "index_written",
            IngestStage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Terminal outcome of ingesting one file.
#[derive(Debug, Serialize)]
pub struct FileOutcome {
    pub file_name: String,
    pub path: PathBuf,
    pub stage: IngestStage,
    pub tables: usize,
    pub columns: usize,
    pub references: usize,
    /// Index documents written (tables plus commented columns).
    pub documents: usize,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<IngestError>,
}

impl FileOutcome {
    pub fn new(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            file_name,
            path,
            stage: IngestStage::Discovered,
            tables: 0,
            columns: 0,
            references: 0,
            documents: 0,
            error: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.error.is_none() && self.stage == IngestStage::Done
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

fn serialize_error<S>(error: &Option<IngestError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match error {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Outcomes of one directory-wide ingestion run, in processing order.
#[derive(Debug, Serialize)]
pub struct IngestReport {
    pub run_id: Uuid,
    pub outcomes: Vec<FileOutcome>,
}

impl IngestReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::now_v7(),
            outcomes: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.is_done())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }
}

impl Default for IngestReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_outcome_uses_base_name() {
        let outcome = FileOutcome::new(PathBuf::from("/data/files/crm.pdm"));
        assert_eq!(outcome.file_name, "crm.pdm");
        assert_eq!(outcome.stage, IngestStage::Discovered);
        assert!(!outcome.is_done());
        assert!(!outcome.is_failed());
    }

    #[test]
    fn test_report_partitions_outcomes() {
        let mut report = IngestReport::new();

        let mut ok = FileOutcome::new(PathBuf::from("a.pdm"));
        ok.stage = IngestStage::Done;
        let mut bad = FileOutcome::new(PathBuf::from("b.pdm"));
        bad.stage = IngestStage::Extracted;
        bad.error = Some(IngestError::MalformedDocument {
            path: PathBuf::from("b.pdm"),
            reason: "unexpected end".to_string(),
        });
        report.outcomes.push(ok);
        report.outcomes.push(bad);

        assert_eq!(report.succeeded().count(), 1);
        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.failed().next().unwrap().file_name, "b.pdm");
    }

    #[test]
    fn test_outcome_serializes_error_as_message() {
        let mut outcome = FileOutcome::new(PathBuf::from("gone.pdm"));
        outcome.error = Some(IngestError::NotFound(PathBuf::from("gone.pdm")));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["error"], "source not found: gone.pdm");
        assert_eq!(json["stage"], "discovered");
    }

    #[test]
    fn test_stage_ordering() {
        assert!(IngestStage::Extracted < IngestStage::CatalogWritten);
        assert!(IngestStage::IndexWritten < IngestStage::Done);
    }
}
