//! Extraction output and the per-session results built on top of it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// One rasterised page, PNG-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageImage {
    /// Rendered width in pixels.
    pub width: u32,
    /// Rendered height in pixels.
    pub height: u32,
    /// PNG file bytes.
    #[serde(skip)]
    pub png: Vec<u8>,
}

impl PageImage {
    pub fn new(width: u32, height: u32, png: Vec<u8>) -> Self {
        Self { width, height, png }
    }

    /// `data:image/png;base64,...` form of the image.
    pub fn to_data_uri(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}

/// Page-ordered text and images of one document.
///
/// Text and images are correlated 1:1 with the page index. The only way to
/// build one is page by page through [`ExtractedContent::push_page`], which
/// keeps the two sequences the same length.
///
/// Serializes for output (page texts plus image sizes, without the PNG
/// bytes); it is never read back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedContent {
    page_texts: Vec<String>,
    images: Vec<PageImage>,
}

impl ExtractedContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next page.
    ///
    /// `fragments` are the page's text runs in reading order; they are joined
    /// with a single space. Line breaks inside a fragment become spaces so
    /// that the assembled [`text`](Self::text) keeps one line per page.
    pub fn push_page<I, S>(&mut self, fragments: I, image: PageImage)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let line = fragments
            .into_iter()
            .map(|f| f.as_ref().replace(['\r', '\n'], " "))
            .collect::<Vec<_>>()
            .join(" ");
        self.page_texts.push(line);
        self.images.push(image);
    }

    pub fn page_count(&self) -> usize {
        self.page_texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page_texts.is_empty()
    }

    /// All pages' text, each page terminated by `\n`.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.page_texts.iter().map(|t| t.len() + 1).sum());
        for page in &self.page_texts {
            out.push_str(page);
            out.push('\n');
        }
        out
    }

    /// Text of a single page (1-indexed), without the trailing newline.
    pub fn page_text(&self, page_num: usize) -> Option<&str> {
        page_num
            .checked_sub(1)
            .and_then(|i| self.page_texts.get(i))
            .map(String::as_str)
    }

    pub fn page_texts(&self) -> &[String] {
        &self.page_texts
    }

    pub fn images(&self) -> &[PageImage] {
        &self.images
    }
}

/// One question/answer exchange of the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub question: String,
    pub answer: String,
    /// `true` when `answer` is the placeholder shown for a failed dispatch.
    pub failed: bool,
}

/// The single summary shown in summarization mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Summary {
    Text(String),
    /// Inline error text displayed instead of a summary.
    Failed(String),
}

impl Summary {
    pub fn as_str(&self) -> &str {
        match self {
            Summary::Text(s) | Summary::Failed(s) => s,
        }
    }
}
