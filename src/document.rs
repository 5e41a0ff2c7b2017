//! The uploaded file: a filename plus its raw bytes.
//!
//! Only the filename decides whether a document is accepted. The bytes are
//! not sniffed here; a `.pdf` that is not really a PDF is caught by the
//! extractor as [`crate::error::ExtractionError::ParseFailure`].

use crate::error::DocumentError;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// An uploaded file, held entirely in memory.
#[derive(Clone)]
pub struct Document {
    filename: String,
    bytes: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a local file into a `Document`, keeping only its file name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| DocumentError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        debug!("Read '{}' ({} bytes)", filename, bytes.len());
        Ok(Self::new(filename, bytes))
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Text after the last `.` of the filename, lower-cased.
    ///
    /// A filename without any `.` yields the whole name.
    pub fn extension(&self) -> String {
        self.filename
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }

    pub fn is_pdf(&self) -> bool {
        self.extension() == "pdf"
    }

    /// Reject anything whose extension is not `pdf`.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.is_pdf() {
            Ok(())
        } else {
            Err(DocumentError::UnsupportedExtension {
                filename: self.filename.clone(),
                extension: self.extension(),
            })
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}
