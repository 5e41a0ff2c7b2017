//! Progress events emitted while a PDF is being extracted.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] through
//! [`crate::config::DocuMindConfigBuilder::progress_callback`]. Events are
//! fired from the blocking thread that drives pdfium, so implementations must
//! be `Send + Sync` and should return quickly.
//!
//! # Example
//!
//! ```rust
//! use documind::{DocuMindConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter(AtomicUsize);
//!
//! impl ExtractionProgressCallback for PageCounter {
//!     fn on_page_extracted(&self, page_num: usize, total_pages: usize, _text_len: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}/{total_pages}");
//!     }
//! }
//!
//! let config = DocuMindConfig::builder()
//!     .endpoint("http://localhost:8080/generate")
//!     .progress_callback(Arc::new(PageCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Receives extraction events. Every method defaults to a no-op.
pub trait ExtractionProgressCallback: Send + Sync {
    /// The PDF opened and has `total_pages` pages.
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Page `page_num` (1-indexed) has been read and rendered.
    ///
    /// `text_len` is the byte length of the page's joined text.
    fn on_page_extracted(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Every page was processed.
    fn on_extraction_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }
}

/// Does nothing; used when no callback is configured.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
