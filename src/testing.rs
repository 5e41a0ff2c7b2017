//! In-memory stand-ins for pdfium and the HTTP backend.

use crate::backend::TextGenerationBackend;
use crate::content::{ExtractedContent, PageImage};
use crate::document::Document;
use crate::error::{DispatchError, ExtractionError};
use crate::pipeline::PdfExtractor;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Content whose page `i` has the text `pages[i]` and a tiny image.
pub fn content_with_pages(pages: &[&str]) -> ExtractedContent {
    let mut content = ExtractedContent::new();
    for (i, text) in pages.iter().enumerate() {
        content.push_page(text.split(' '), PageImage::new(10 + i as u32, 20, vec![i as u8]));
    }
    content
}

type Reply = (Option<Duration>, Result<Option<String>, DispatchError>);

/// Backend answering from a queue of canned replies.
///
/// Once the queue is empty every call answers `Ok(Some("ok"))`.
#[derive(Default)]
pub struct FakeBackend {
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, reply: Result<Option<String>, DispatchError>) -> Self {
        self.replies.lock().unwrap().push_back((None, reply));
        self
    }

    /// Queue a reply that only arrives after `delay`.
    pub fn reply_after(self, delay: Duration, reply: Result<Option<String>, DispatchError>) -> Self {
        self.replies.lock().unwrap().push_back((Some(delay), reply));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl TextGenerationBackend for FakeBackend {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Option<String>, DispatchError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let (delay, reply) = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((None, Ok(Some("ok".to_string()))));
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            reply
        })
    }
}

/// Extractor reading the document bytes as UTF-8 text.
///
/// Pages are separated by form feeds (`\x0c`) and fragments by spaces.
/// Bytes starting with `BAD` fail with `ParseFailure`; filenames starting
/// with `slow` take 100ms.
#[derive(Default)]
pub struct FakeExtractor {
    calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PdfExtractor for FakeExtractor {
    fn extract(&self, document: Document) -> BoxFuture<'_, Result<ExtractedContent, ExtractionError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if document.filename().starts_with("slow") {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            let text = String::from_utf8_lossy(document.bytes()).into_owned();
            if text.starts_with("BAD") {
                return Err(ExtractionError::ParseFailure {
                    detail: "no header".into(),
                });
            }
            let mut content = ExtractedContent::new();
            if !text.is_empty() {
                for (i, page) in text.split('\x0c').enumerate() {
                    content.push_page(page.split(' '), PageImage::new(100, 100, vec![i as u8]));
                }
            }
            Ok(content)
        })
    }
}
