//! One document's lifecycle: upload, extract, then ask or summarize.
//!
//! All mutable state sits in a single [`Mutex`]-guarded value and moves
//! through explicit transitions:
//!
//! ```text
//!            upload(pdf)            Ok              ask / summarize
//!   Idle ───────────────▶ Extracting ──▶ Ready ◀──────────────────▶ Dispatching
//!    ▲                        │ Err                  (none left in flight)
//!    └────────────────────────┘
//!   upload(non-pdf) / reset from any state ──▶ Idle
//! ```
//!
//! Every upload (and every reset or rejected upload) starts a new
//! *generation* and cancels the previous generation's token. Work that
//! finishes for an older generation is discarded and reported as
//! [`SessionError::Superseded`]; it never overwrites newer state. A newer
//! `summarize` call supersedes an older one in the same way.
//!
//! The lock is never held across an `.await`.

use crate::backend::{GeminiBackend, TextGenerationBackend};
use crate::config::DocuMindConfig;
use crate::content::{ExtractedContent, Summary, TranscriptEntry};
use crate::dispatch::{Query, QueryDispatcher};
use crate::document::Document;
use crate::error::{ConfigError, DispatchError, SessionError};
use crate::pipeline::{PdfExtractor, PdfiumExtractor};
use crate::prompts::FAILURE_PLACEHOLDER;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Where the session is in the document lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No document.
    Idle,
    /// A document is being extracted.
    Extracting,
    /// Content is available and nothing is in flight.
    Ready,
    /// At least one question or summary request is in flight.
    Dispatching,
}

struct Inner {
    state: SessionState,
    generation: u64,
    cancel: CancellationToken,
    content: Option<Arc<ExtractedContent>>,
    transcript: Vec<TranscriptEntry>,
    summary: Option<Summary>,
    in_flight: usize,
    summary_seq: u64,
    summary_cancel: CancellationToken,
}

impl Inner {
    fn new() -> Self {
        let cancel = CancellationToken::new();
        Self {
            state: SessionState::Idle,
            generation: 0,
            summary_cancel: cancel.child_token(),
            cancel,
            content: None,
            transcript: Vec::new(),
            summary: None,
            in_flight: 0,
            summary_seq: 0,
        }
    }

    fn transition(&mut self, to: SessionState) {
        if self.state != to {
            debug!(generation = self.generation, "Session {:?} → {:?}", self.state, to);
            self.state = to;
        }
    }

    /// Drop everything derived from the current document and invalidate
    /// whatever is still running for it.
    fn new_generation(&mut self, state: SessionState) -> (u64, CancellationToken) {
        self.cancel.cancel();
        self.generation += 1;
        self.cancel = CancellationToken::new();
        self.summary_cancel = self.cancel.child_token();
        self.content = None;
        self.transcript.clear();
        self.summary = None;
        self.in_flight = 0;
        self.transition(state);
        (self.generation, self.cancel.clone())
    }

    fn begin_dispatch(&mut self) {
        self.in_flight += 1;
        self.transition(SessionState::Dispatching);
    }

    fn end_dispatch(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.transition(SessionState::Ready);
        }
    }
}

/// Drives one document through extraction and any number of queries.
///
/// Methods take `&self`; the session can be shared (e.g. in an `Arc`) and
/// called from overlapping tasks, with stale outcomes discarded.
pub struct Session<E, B> {
    extractor: E,
    dispatcher: QueryDispatcher<B>,
    inner: Mutex<Inner>,
}

/// Session wired to pdfium and a Gemini-style endpoint.
pub type DefaultSession = Session<PdfiumExtractor, GeminiBackend>;

impl DefaultSession {
    pub fn from_config(config: &DocuMindConfig) -> Result<Self, ConfigError> {
        Ok(Session::new(
            PdfiumExtractor::from_config(config),
            QueryDispatcher::from_config(config)?,
        ))
    }
}

impl<E: PdfExtractor, B: TextGenerationBackend> Session<E, B> {
    pub fn new(extractor: E, dispatcher: QueryDispatcher<B>) -> Self {
        Self {
            extractor,
            dispatcher,
            inner: Mutex::new(Inner::new()),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn dispatcher(&self) -> &QueryDispatcher<B> {
        &self.dispatcher
    }

    /// Accept a new document, replacing everything derived from the last one.
    ///
    /// Returns the number of extracted pages. A non-PDF filename clears the
    /// session without invoking the extractor.
    pub async fn upload(&self, document: Document) -> Result<usize, SessionError> {
        if let Err(e) = document.validate() {
            warn!("Rejected upload: {}", e);
            self.inner().new_generation(SessionState::Idle);
            return Err(SessionError::UnsupportedFile {
                filename: document.filename().to_string(),
            });
        }

        let (generation, token) = self.inner().new_generation(SessionState::Extracting);
        info!(generation, "Upload accepted: '{}'", document.filename());

        let outcome = tokio::select! {
            _ = token.cancelled() => {
                debug!(generation, "Extraction superseded before completion");
                return Err(SessionError::Superseded);
            }
            r = self.extractor.extract(document) => r,
        };

        let mut inner = self.inner();
        if inner.generation != generation {
            return Err(SessionError::Superseded);
        }
        match outcome {
            Ok(content) => {
                let pages = content.page_count();
                inner.content = Some(Arc::new(content));
                inner.transition(SessionState::Ready);
                info!(generation, pages, "Document ready");
                Ok(pages)
            }
            Err(e) => {
                warn!(generation, "Extraction failed: {}", e);
                inner.content = None;
                inner.transition(SessionState::Idle);
                Err(e.into())
            }
        }
    }

    /// Ask a question about the current document.
    ///
    /// Answers, and failed attempts, are appended to the transcript.
    /// Precondition failures (`NoDocument`, `EmptyQuery`) leave it untouched.
    pub async fn ask(&self, question: impl Into<String>) -> Result<String, SessionError> {
        let question = question.into();
        let query = Query::Question(question.clone());

        let (content, generation, token) = {
            let mut inner = self.inner();
            let content = Self::checked_content(&inner, &query)?;
            inner.begin_dispatch();
            (content, inner.generation, inner.cancel.clone())
        };

        let outcome = tokio::select! {
            _ = token.cancelled() => None,
            r = self.dispatcher.dispatch(&content, &query) => Some(r),
        };

        let mut inner = self.inner();
        let Some(outcome) = outcome.filter(|_| inner.generation == generation) else {
            return Err(SessionError::Superseded);
        };
        inner.end_dispatch();

        match outcome {
            Ok(answer) => {
                inner.transcript.push(TranscriptEntry {
                    question,
                    answer: answer.clone(),
                    failed: false,
                });
                Ok(answer)
            }
            Err(e) => {
                inner.transcript.push(TranscriptEntry {
                    question,
                    answer: FAILURE_PLACEHOLDER.to_string(),
                    failed: true,
                });
                Err(e.into())
            }
        }
    }

    /// Summarize the current document, replacing any previous summary.
    pub async fn summarize(&self, word_limit: u32) -> Result<String, SessionError> {
        let query = Query::summarize(word_limit);

        let (content, generation, seq, token) = {
            let mut inner = self.inner();
            let content = Self::checked_content(&inner, &query)?;
            inner.summary_cancel.cancel();
            inner.summary_cancel = inner.cancel.child_token();
            inner.summary_seq += 1;
            inner.summary = None;
            inner.begin_dispatch();
            (
                content,
                inner.generation,
                inner.summary_seq,
                inner.summary_cancel.clone(),
            )
        };

        let outcome = tokio::select! {
            _ = token.cancelled() => None,
            r = self.dispatcher.dispatch(&content, &query) => Some(r),
        };

        let mut inner = self.inner();
        if inner.generation != generation {
            return Err(SessionError::Superseded);
        }
        inner.end_dispatch();
        let Some(outcome) = outcome.filter(|_| inner.summary_seq == seq) else {
            debug!(seq, "Summary superseded by a newer request");
            return Err(SessionError::Superseded);
        };

        match outcome {
            Ok(summary) => {
                inner.summary = Some(Summary::Text(summary.clone()));
                Ok(summary)
            }
            Err(e) => {
                let shown = match &e {
                    DispatchError::BackendError(message) => format!("Error: {}", message),
                    _ => FAILURE_PLACEHOLDER.to_string(),
                };
                inner.summary = Some(Summary::Failed(shown));
                Err(e.into())
            }
        }
    }

    /// Forget the document and everything derived from it.
    pub fn reset(&self) {
        self.inner().new_generation(SessionState::Idle);
    }

    pub fn state(&self) -> SessionState {
        self.inner().state
    }

    pub fn content(&self) -> Option<Arc<ExtractedContent>> {
        self.inner().content.clone()
    }

    /// Question/answer pairs, oldest first.
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.inner().transcript.clone()
    }

    pub fn summary(&self) -> Option<Summary> {
        self.inner().summary.clone()
    }

    fn checked_content(inner: &Inner, query: &Query) -> Result<Arc<ExtractedContent>, DispatchError> {
        let content = inner.content.clone().ok_or(DispatchError::NoDocument)?;
        QueryDispatcher::<B>::validate(&content, query)?;
        Ok(content)
    }
}
