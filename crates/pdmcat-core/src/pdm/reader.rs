//! Document reader: loads a model file and parses it into a tree.
//!
//! Whole-file parsing is used; the only size bound is available memory.
//! The tree borrows from the loaded text, so a [`PdmTree`] cannot outlive
//! the [`PdmSource`] it was parsed from.

use std::path::{Path, PathBuf};

use pdmcat_types::error::IngestError;

use super::encoding::decode_document;

/// Raw text of one model file.
#[derive(Debug)]
pub struct PdmSource {
    path: PathBuf,
    text: String,
}

/// Parsed model document.
pub struct PdmTree<'input> {
    doc: roxmltree::Document<'input>,
}

impl PdmSource {
    /// Read a model file into memory, decoding it per its byte order mark
    /// or XML declaration.
    ///
    /// Fails with [`IngestError::NotFound`] when the path does not exist and
    /// with [`IngestError::MalformedDocument`] when the bytes cannot be
    /// decoded.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref().to_path_buf();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(IngestError::NotFound(path));
            }
            Err(err) => {
                return Err(IngestError::Io {
                    path,
                    message: err.to_string(),
                });
            }
        };
        match decode_document(&bytes) {
            Ok(text) => Ok(Self::from_text(path, text)),
            Err(reason) => Err(IngestError::MalformedDocument { path, reason }),
        }
    }

    /// Wrap already loaded text, e.g. a document received over the wire.
    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let mut text = text.into();
        if text.starts_with('\u{feff}') {
            text.drain(..'\u{feff}'.len_utf8());
        }
        Self {
            path: path.into(),
            text,
        }
    }

    /// Base name of the source, used as the catalog's file identity.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Parse the text as well-formed XML.
    ///
    /// PowerDesigner exports may carry a DTD, so DTDs are accepted.
    pub fn parse(&self) -> Result<PdmTree<'_>, IngestError> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        roxmltree::Document::parse_with_options(&self.text, options)
            .map(|doc| PdmTree { doc })
            .map_err(|err| IngestError::MalformedDocument {
                path: self.path.clone(),
                reason: err.to_string(),
            })
    }
}

impl<'input> PdmTree<'input> {
    /// The document's root element.
    pub fn root(&self) -> roxmltree::Node<'_, 'input> {
        self.doc.root_element()
    }
}
