//! pdfium-backed extraction: read every page's text runs and rasterise it.
//!
//! pdfium keeps thread-local state and blocks while it parses and renders,
//! so all of the work below runs inside `tokio::task::spawn_blocking` with a
//! fresh `Pdfium` binding per document.
//!
//! Pages are rendered at scale 1.0: one pixel per PDF point, so the bitmap
//! has exactly the page's natural dimensions.

use crate::config::DocuMindConfig;
use crate::content::ExtractedContent;
use crate::document::Document;
use crate::error::ExtractionError;
use crate::pipeline::{encode, PdfExtractor};
use crate::progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
use futures::future::BoxFuture;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Environment variable naming a pdfium library file or the directory holding it.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

const RENDER_SCALE: f32 = 1.0;

/// [`PdfExtractor`] built on pdfium-render.
#[derive(Clone)]
pub struct PdfiumExtractor {
    library_path: Option<PathBuf>,
    password: Option<String>,
    progress: ProgressCallback,
}

impl PdfiumExtractor {
    /// Extractor that locates pdfium via `PDFIUM_LIB_PATH`, the current
    /// directory, then the system library path.
    pub fn new() -> Self {
        Self {
            library_path: std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from),
            password: None,
            progress: Arc::new(NoopProgressCallback),
        }
    }

    /// Take the password and progress callback from `config`.
    pub fn from_config(config: &DocuMindConfig) -> Self {
        let mut extractor = Self::new();
        extractor.password = config.password.clone();
        if let Some(cb) = &config.progress_callback {
            extractor.progress = Arc::clone(cb);
        }
        extractor
    }

    /// Bind to this pdfium library (a file, or a directory containing one).
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_progress(mut self, cb: ProgressCallback) -> Self {
        self.progress = cb;
        self
    }
}

impl Default for PdfiumExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for PdfiumExtractor {
    fn extract(&self, document: Document) -> BoxFuture<'_, Result<ExtractedContent, ExtractionError>> {
        let library_path = self.library_path.clone();
        let password = self.password.clone();
        let progress = Arc::clone(&self.progress);

        Box::pin(async move {
            info!(
                "Extracting '{}' ({} bytes)",
                document.filename(),
                document.bytes().len()
            );
            let bytes = document.into_bytes();

            tokio::task::spawn_blocking(move || {
                let pdfium = bind_pdfium(library_path.as_deref())?;
                extract_blocking(&pdfium, bytes, password.as_deref(), progress.as_ref())
            })
            .await
            .map_err(|e| ExtractionError::Internal(format!("Extraction task panicked: {}", e)))?
        })
    }
}

/// Bind to pdfium: explicit path first, then `./`, then the system library.
fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, ExtractionError> {
    let explicit = library_path.map(|p| {
        if p.is_dir() {
            let dir = p.to_string_lossy().into_owned();
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir.as_str()))
        } else {
            Pdfium::bind_to_library(p)
        }
    });

    let bindings = match explicit {
        Some(result) => result,
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ExtractionError::PdfiumUnavailable(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Walk every page in order, collecting text and a PNG per page.
fn extract_blocking(
    pdfium: &Pdfium,
    bytes: Vec<u8>,
    password: Option<&str>,
    progress: &dyn ExtractionProgressCallback,
) -> Result<ExtractedContent, ExtractionError> {
    let document = pdfium
        .load_pdf_from_byte_vec(bytes, password)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            let detail = if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    format!("wrong password ({err_str})")
                } else {
                    format!("document is encrypted and requires a password ({err_str})")
                }
            } else {
                err_str
            };
            ExtractionError::ParseFailure { detail }
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);
    progress.on_extraction_start(total_pages);

    let render_config = PdfRenderConfig::new().scale_page_by_factor(RENDER_SCALE);
    let mut content = ExtractedContent::new();

    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;

        let fragments: Vec<String> = page
            .text()
            .map_err(|e| ExtractionError::TextFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })?
            .segments()
            .iter()
            .map(|segment| segment.text())
            .collect();

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| ExtractionError::RenderFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })?;
        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px, {} text runs",
            page_num,
            image.width(),
            image.height(),
            fragments.len()
        );

        let png = encode::encode_page(&image).map_err(|e| ExtractionError::RenderFailed {
            page: page_num,
            detail: format!("PNG encoding failed: {}", e),
        })?;

        content.push_page(&fragments, png);
        let text_len = content.page_text(page_num).map_or(0, str::len);
        progress.on_page_extracted(page_num, total_pages, text_len);
    }

    progress.on_extraction_complete(total_pages);
    Ok(content)
}
