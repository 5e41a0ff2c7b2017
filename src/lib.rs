//! # documind
//!
//! Ask questions about a PDF, or summarize it, with a generative-language
//! backend.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF file
//!  │
//!  ├─ 1. Accept    filename must end in .pdf (any case)
//!  ├─ 2. Extract   pdfium: page text runs + one PNG per page (spawn_blocking)
//!  ├─ 3. Prompt    question or word-limited summary + full text + image refs
//!  ├─ 4. Dispatch  one POST to a generateContent endpoint
//!  └─ 5. Collect   chat transcript (questions) or latest summary
//! ```
//!
//! [`Session`] sequences these steps for one document at a time and keeps
//! the state consistent when uploads and queries overlap.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use documind::{DefaultSession, DocuMindConfig, Document};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // DOCUMIND_ENDPOINT, or GEMINI_API_KEY (+ optional DOCUMIND_MODEL)
//!     let config = DocuMindConfig::from_env()?;
//!     let session = DefaultSession::from_config(&config)?;
//!
//!     session.upload(Document::from_path("report.pdf").await?).await?;
//!     println!("{}", session.summarize(config.default_word_limit).await?);
//!     println!("{}", session.ask("Who wrote this report?").await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `documind` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## pdfium
//!
//! Extraction binds to a pdfium shared library at runtime: the path in
//! `PDFIUM_LIB_PATH` (file or directory), then the current directory, then
//! the system library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod content;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;

#[cfg(test)]
mod testing;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{GeminiBackend, TextGenerationBackend};
pub use config::{DocuMindConfig, DocuMindConfigBuilder, ImageReferenceStyle};
pub use content::{ExtractedContent, PageImage, Summary, TranscriptEntry};
pub use dispatch::{Query, QueryDispatcher};
pub use document::Document;
pub use error::{ConfigError, DispatchError, DocumentError, ExtractionError, SessionError};
pub use pipeline::{PdfExtractor, PdfiumExtractor};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{DefaultSession, Session, SessionState};
