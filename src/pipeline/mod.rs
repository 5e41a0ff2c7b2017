//! The extraction pipeline: PDF bytes → page text + page images.
//!
//! ```text
//! Document ──▶ render ─────────────▶ encode ──▶ ExtractedContent
//! (bytes)      (pdfium: text runs,    (PNG)      (text blob + images)
//!               1:1 raster per page)
//! ```
//!
//! 1. [`render`] — open the PDF with pdfium and walk pages in order, reading
//!    each page's text runs and rasterising it at its natural size. Runs in
//!    `spawn_blocking` because pdfium is synchronous and CPU-bound.
//! 2. [`encode`] — PNG-encode each rendered page.
//!
//! The pdfium dependency sits behind [`PdfExtractor`] so a session can be
//! driven by any other extractor, including in-memory fakes in tests.

pub mod encode;
pub mod render;

use crate::content::ExtractedContent;
use crate::document::Document;
use crate::error::ExtractionError;
use futures::future::BoxFuture;

pub use render::PdfiumExtractor;

/// Turns an accepted document into page-ordered text and images.
///
/// Implementations must process every page or fail as a whole; a partial
/// [`ExtractedContent`] is never returned.
pub trait PdfExtractor: Send + Sync {
    fn extract(&self, document: Document) -> BoxFuture<'_, Result<ExtractedContent, ExtractionError>>;
}
