//! Error types for the documind library.
//!
//! Each stage owns its error type so callers can react to exactly the
//! failures that stage can produce:
//!
//! * [`DocumentError`]: the file offered for upload was rejected before any
//!   PDF work started (wrong extension, unreadable path).
//! * [`ExtractionError`]: the PDF could not be turned into text and page
//!   images. Extraction is all-or-nothing, so any of these discards the
//!   whole result.
//! * [`DispatchError`]: a question or summary request could not be answered.
//!   The extracted content survives these; the user may simply retry.
//! * [`SessionError`]: what [`crate::session::Session`] reports, wrapping the
//!   above plus [`SessionError::Superseded`] for outcomes made stale by a
//!   newer upload or request.
//! * [`ConfigError`]: [`crate::config::DocuMindConfigBuilder::build`]
//!   validation.
//!
//! None of these are fatal to the process.

use std::path::PathBuf;
use thiserror::Error;

/// The upload was refused before extraction.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Only `.pdf` files (any case) are accepted.
    #[error("Only PDF files are allowed: '{filename}' has extension '{extension}'")]
    UnsupportedExtension { filename: String, extension: String },

    /// The file could not be read from disk.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Turning a PDF payload into [`crate::content::ExtractedContent`] failed.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The payload is not a PDF pdfium can open (corrupt, truncated,
    /// encrypted without the right password, or not a PDF at all).
    #[error("PDF could not be parsed: {detail}")]
    ParseFailure { detail: String },

    /// A page's text layer could not be read.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextFailed { page: usize, detail: String },

    /// A page could not be rasterised or PNG-encoded.
    #[error("Rendering failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// Could not bind to a pdfium shared library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (or its directory), or install pdfium system-wide."
    )]
    PdfiumUnavailable(String),

    /// The blocking extraction task panicked or was cancelled.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A question or summary request could not be answered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No document has been extracted (or it has no pages).
    #[error("Please upload a PDF first.")]
    NoDocument,

    /// Question mode with a blank question.
    #[error("Please enter a question.")]
    EmptyQuery,

    /// The backend answered with an `error.message`, or a bare error status.
    #[error("Backend error: {0}")]
    BackendError(String),

    /// The request never produced a readable response.
    #[error("Transport failure: {0}")]
    TransportFailure(String),
}

impl DispatchError {
    /// `true` for the variants raised before any request is sent.
    pub fn is_precondition(&self) -> bool {
        matches!(self, DispatchError::NoDocument | DispatchError::EmptyQuery)
    }
}

/// Failures reported by [`crate::session::Session`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// The uploaded file is not a PDF; all derived state was cleared.
    #[error("Only PDF files are allowed: '{filename}'")]
    UnsupportedFile { filename: String },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A newer upload (or a newer summary request) replaced the one this
    /// call was working for; its outcome was discarded.
    #[error("Operation superseded by a newer request")]
    Superseded,
}

/// Configuration validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither an explicit endpoint nor an API key was supplied.
    #[error(
        "No generative-text endpoint configured.\n\
Set DOCUMIND_ENDPOINT to the full URL, or GEMINI_API_KEY to use the Gemini API."
    )]
    MissingEndpoint,

    /// The endpoint is not an absolute http(s) URL.
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Any other out-of-range value.
    #[error("Invalid configuration: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_display() {
        let e = DocumentError::UnsupportedExtension {
            filename: "notes.docx".into(),
            extension: "docx".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("notes.docx"), "got: {msg}");
        assert!(msg.contains("docx"), "got: {msg}");
    }

    #[test]
    fn backend_error_carries_message() {
        let e = DispatchError::BackendError("quota exceeded".into());
        assert!(e.to_string().contains("quota exceeded"));
    }

    #[test]
    fn preconditions_are_flagged() {
        assert!(DispatchError::NoDocument.is_precondition());
        assert!(DispatchError::EmptyQuery.is_precondition());
        assert!(!DispatchError::BackendError("x".into()).is_precondition());
        assert!(!DispatchError::TransportFailure("x".into()).is_precondition());
    }

    #[test]
    fn session_error_is_transparent_over_dispatch() {
        let e: SessionError = DispatchError::EmptyQuery.into();
        assert_eq!(e.to_string(), "Please enter a question.");
    }

    #[test]
    fn render_failed_mentions_page() {
        let e = ExtractionError::RenderFailed {
            page: 3,
            detail: "bitmap allocation failed".into(),
        };
        assert!(e.to_string().contains("page 3"));
    }
}
