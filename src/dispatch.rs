//! Query dispatch: one extracted document + one instruction → one answer.
//!
//! The dispatcher is stateless. It checks preconditions, assembles the
//! prompt from [`crate::prompts`], hands it to a [`TextGenerationBackend`]
//! and maps the outcome. Accumulating answers into a transcript, or keeping
//! the latest summary, is the caller's job (see [`crate::session`]).

use crate::backend::{GeminiBackend, TextGenerationBackend};
use crate::config::{DocuMindConfig, ImageReferenceStyle};
use crate::content::ExtractedContent;
use crate::error::{ConfigError, DispatchError};
use crate::prompts;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Answer a free-form question from the document only.
    Question(String),
    /// Summarize the document in at most `word_limit` words.
    Summarize { word_limit: u32 },
}

impl Query {
    pub fn question(q: impl Into<String>) -> Self {
        Query::Question(q.into())
    }

    pub fn summarize(word_limit: u32) -> Self {
        Query::Summarize { word_limit }
    }

    /// Answer used when the backend returned no candidate text.
    pub fn fallback_answer(&self) -> &'static str {
        match self {
            Query::Question(_) => prompts::NO_ANSWER_FALLBACK,
            Query::Summarize { .. } => prompts::NO_SUMMARY_FALLBACK,
        }
    }

    fn mode(&self) -> &'static str {
        match self {
            Query::Question(_) => "question",
            Query::Summarize { .. } => "summary",
        }
    }
}

/// Builds prompts and sends them through a backend.
#[derive(Debug, Clone)]
pub struct QueryDispatcher<B> {
    backend: B,
    image_reference: ImageReferenceStyle,
}

impl QueryDispatcher<GeminiBackend> {
    /// Dispatcher talking to the endpoint in `config`.
    pub fn from_config(config: &DocuMindConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(GeminiBackend::from_config(config)?).with_image_reference(config.image_reference))
    }
}

impl<B: TextGenerationBackend> QueryDispatcher<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            image_reference: ImageReferenceStyle::default(),
        }
    }

    pub fn with_image_reference(mut self, style: ImageReferenceStyle) -> Self {
        self.image_reference = style;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Check everything that can fail before a request is sent.
    ///
    /// Empty content wins over an empty question.
    pub fn validate(content: &ExtractedContent, query: &Query) -> Result<(), DispatchError> {
        if content.is_empty() {
            return Err(DispatchError::NoDocument);
        }
        if let Query::Question(q) = query {
            if q.trim().is_empty() {
                return Err(DispatchError::EmptyQuery);
            }
        }
        Ok(())
    }

    /// The full prompt that [`dispatch`](Self::dispatch) would send.
    pub fn build_prompt(&self, content: &ExtractedContent, query: &Query) -> String {
        let text = content.text();
        let images = prompts::image_references(content.images(), self.image_reference);
        match query {
            Query::Question(q) => prompts::question_prompt(&text, &images, q),
            Query::Summarize { word_limit } => prompts::summary_prompt(&text, &images, *word_limit),
        }
    }

    /// Send exactly one request for `query` against `content`.
    ///
    /// A response without candidate text is still `Ok`, carrying
    /// [`Query::fallback_answer`].
    pub async fn dispatch(&self, content: &ExtractedContent, query: &Query) -> Result<String, DispatchError> {
        Self::validate(content, query)?;

        let prompt = self.build_prompt(content, query);
        let start = Instant::now();
        info!(
            mode = query.mode(),
            pages = content.page_count(),
            prompt_bytes = prompt.len(),
            "Dispatching query"
        );

        match self.backend.generate(&prompt).await {
            Ok(Some(answer)) => {
                debug!(
                    mode = query.mode(),
                    answer_bytes = answer.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Query answered"
                );
                Ok(answer)
            }
            Ok(None) => {
                warn!(mode = query.mode(), "Backend returned no candidate text");
                Ok(query.fallback_answer().to_string())
            }
            Err(e) => {
                warn!(mode = query.mode(), "Dispatch failed: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{content_with_pages, FakeBackend};

    #[tokio::test]
    async fn empty_content_is_no_document_for_every_query() {
        let dispatcher = QueryDispatcher::new(FakeBackend::new());
        let empty = ExtractedContent::new();

        for query in [Query::question("What?"), Query::question(""), Query::summarize(50)] {
            assert_eq!(
                dispatcher.dispatch(&empty, &query).await,
                Err(DispatchError::NoDocument),
                "query: {query:?}"
            );
        }
        assert_eq!(dispatcher.backend().calls(), 0);
    }

    #[tokio::test]
    async fn blank_question_is_empty_query_without_a_call() {
        let dispatcher = QueryDispatcher::new(FakeBackend::new());
        let content = content_with_pages(&["alpha"]);

        for q in ["", "   ", "\n\t"] {
            assert_eq!(
                dispatcher.dispatch(&content, &Query::question(q)).await,
                Err(DispatchError::EmptyQuery)
            );
        }
        assert_eq!(dispatcher.backend().calls(), 0);
    }

    #[tokio::test]
    async fn answer_is_passed_through() {
        let backend = FakeBackend::new().reply(Ok(Some("Paris".into())));
        let dispatcher = QueryDispatcher::new(backend);
        let content = content_with_pages(&["France capital Paris"]);

        let answer = dispatcher
            .dispatch(&content, &Query::question("What is the capital?"))
            .await;
        assert_eq!(answer, Ok("Paris".to_string()));
        assert_eq!(dispatcher.backend().calls(), 1);

        let prompt = &dispatcher.backend().prompts()[0];
        assert!(prompt.contains("PDF Text: France capital Paris\n"));
        assert!(prompt.contains("User Question: What is the capital?"));
    }

    #[tokio::test]
    async fn missing_text_falls_back_per_mode() {
        let backend = FakeBackend::new().reply(Ok(None)).reply(Ok(None));
        let dispatcher = QueryDispatcher::new(backend);
        let content = content_with_pages(&["x"]);

        assert_eq!(
            dispatcher.dispatch(&content, &Query::question("q")).await,
            Ok("No response returned.".to_string())
        );
        assert_eq!(
            dispatcher.dispatch(&content, &Query::summarize(10)).await,
            Ok("No summary returned.".to_string())
        );
    }

    #[tokio::test]
    async fn backend_errors_propagate() {
        let backend = FakeBackend::new()
            .reply(Err(DispatchError::BackendError("quota exceeded".into())))
            .reply(Err(DispatchError::TransportFailure("connection reset".into())));
        let dispatcher = QueryDispatcher::new(backend);
        let content = content_with_pages(&["x"]);

        assert_eq!(
            dispatcher.dispatch(&content, &Query::summarize(50)).await,
            Err(DispatchError::BackendError("quota exceeded".into()))
        );
        assert_eq!(
            dispatcher.dispatch(&content, &Query::question("q")).await,
            Err(DispatchError::TransportFailure("connection reset".into()))
        );
    }

    #[test]
    fn summary_prompt_includes_limit_and_every_page() {
        let dispatcher = QueryDispatcher::new(FakeBackend::new())
            .with_image_reference(ImageReferenceStyle::Placeholder);
        let content = content_with_pages(&["one", "two", "three"]);

        let prompt = dispatcher.build_prompt(&content, &Query::summarize(50));
        assert!(prompt.contains("Text: one\ntwo\nthree\n"));
        assert!(prompt.contains("[page 1: "));
        assert!(prompt.contains("[page 3: "));
        assert!(prompt.contains("maximum of 50 words"));
    }

    #[test]
    fn validate_orders_checks() {
        let empty = ExtractedContent::new();
        assert_eq!(
            QueryDispatcher::<FakeBackend>::validate(&empty, &Query::question("")),
            Err(DispatchError::NoDocument)
        );
        let content = content_with_pages(&["x"]);
        assert_eq!(
            QueryDispatcher::<FakeBackend>::validate(&content, &Query::summarize(0)),
            Ok(())
        );
    }
}
