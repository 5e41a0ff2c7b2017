//! Text-generation backends.
//!
//! [`TextGenerationBackend`] is the narrow seam between the dispatcher and a
//! concrete wire format. [`GeminiBackend`] speaks the Gemini
//! `generateContent` JSON shape over one HTTP POST:
//!
//! ```text
//! → {"contents":[{"parts":[{"text":"<prompt>"}]}]}
//! ← {"candidates":[{"content":{"parts":[{"text":"<answer>"}]}}]}
//! ← {"error":{"message":"<why>"}}
//! ```
//!
//! No retries: every dispatch is exactly one request.

use crate::config::DocuMindConfig;
use crate::error::{ConfigError, DispatchError};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Sends one prompt and returns the first candidate's text.
///
/// `Ok(None)` means the backend answered successfully but without any text;
/// the dispatcher turns that into a fallback message.
pub trait TextGenerationBackend: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Option<String>, DispatchError>>;
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

impl<'a> GenerateRequest<'a> {
    fn single(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

impl GenerateResponse {
    /// `candidates[0].content.parts[0].text`, if present and non-empty.
    fn first_text(self) -> Option<String> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.is_empty())
    }
}

// ── Gemini ───────────────────────────────────────────────────────────────

/// Backend for a Gemini-style `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    endpoint: String,
    redacted_endpoint: String,
    timeout_secs: Option<u64>,
}

impl GeminiBackend {
    pub fn from_config(config: &DocuMindConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::InvalidValue(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            redacted_endpoint: config.redacted_endpoint(),
            timeout_secs: config.request_timeout_secs,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> DispatchError {
        if e.is_timeout() {
            let secs = self.timeout_secs.unwrap_or_default();
            DispatchError::TransportFailure(format!("request timed out after {}s", secs))
        } else {
            DispatchError::TransportFailure(e.without_url().to_string())
        }
    }

    async fn post(&self, prompt: &str) -> Result<Option<String>, DispatchError> {
        debug!(
            endpoint = %self.redacted_endpoint,
            prompt_bytes = prompt.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest::single(prompt))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        debug!(%status, body_bytes = body.len(), "Received response");

        match serde_json::from_slice::<GenerateResponse>(&body) {
            Ok(parsed) => {
                if let Some(err) = parsed.error {
                    let message = err
                        .message
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| format!("HTTP {}", status));
                    warn!(%status, "Backend reported an error: {}", message);
                    return Err(DispatchError::BackendError(message));
                }
                if !status.is_success() {
                    warn!(%status, "Backend returned an error status without a message");
                    return Err(DispatchError::BackendError(format!("HTTP {}", status)));
                }
                Ok(parsed.first_text())
            }
            Err(e) if !status.is_success() => {
                warn!(%status, "Backend returned an error status with an unreadable body: {}", e);
                Err(DispatchError::BackendError(format!("HTTP {}", status)))
            }
            Err(e) => {
                warn!("Malformed response body: {}", e);
                Err(DispatchError::TransportFailure(format!(
                    "malformed response body: {}",
                    e
                )))
            }
        }
    }
}

impl fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("endpoint", &self.redacted_endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl TextGenerationBackend for GeminiBackend {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Option<String>, DispatchError>> {
        Box::pin(self.post(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer, timeout: Option<u64>) -> GeminiBackend {
        let mut builder =
            DocuMindConfig::builder().endpoint(format!("{}/v1beta/models/m:generateContent?key=k", server.uri()));
        if let Some(secs) = timeout {
            builder = builder.request_timeout_secs(secs);
        }
        GeminiBackend::from_config(&builder.build().unwrap()).unwrap()
    }

    async fn mount(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/v1beta/models/m:generateContent"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[test]
    fn first_text_walks_the_nested_shape() {
        let parsed: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "first"}, {"text": "second"}]}},
                {"content": {"parts": [{"text": "other"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(parsed.first_text().as_deref(), Some("first"));
    }

    #[test]
    fn first_text_missing_pieces() {
        for body in [
            serde_json::json!({}),
            serde_json::json!({"candidates": null}),
            serde_json::json!({"candidates": []}),
            serde_json::json!({"candidates": [{}]}),
            serde_json::json!({"candidates": [{"content": {"parts": []}}]}),
            serde_json::json!({"candidates": [{"content": {"parts": [{}]}}]}),
            serde_json::json!({"candidates": [{"content": {"parts": [{"text": ""}]}}]}),
        ] {
            let parsed: GenerateResponse = serde_json::from_value(body.clone()).unwrap();
            assert_eq!(parsed.first_text(), None, "body: {body}");
        }
    }

    #[tokio::test]
    async fn success_returns_first_candidate_text() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "Paris"}]}}]
            })),
        )
        .await;

        let backend = backend_for(&server, None);
        assert_eq!(backend.generate("prompt").await, Ok(Some("Paris".to_string())));
    }

    #[tokio::test]
    async fn request_body_has_single_text_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server, None);
        backend.generate("the whole prompt").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"contents": [{"parts": [{"text": "the whole prompt"}]}]})
        );
        assert_eq!(requests[0].url.query(), Some("key=k"));
    }

    #[tokio::test]
    async fn missing_candidates_is_ok_none() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
        )
        .await;

        let backend = backend_for(&server, None);
        assert_eq!(backend.generate("p").await, Ok(None));
    }

    #[tokio::test]
    async fn error_message_maps_to_backend_error() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"code": 429, "message": "quota exceeded", "status": "RESOURCE_EXHAUSTED"}
            })),
        )
        .await;

        let backend = backend_for(&server, None);
        assert_eq!(
            backend.generate("p").await,
            Err(DispatchError::BackendError("quota exceeded".into()))
        );
    }

    #[tokio::test]
    async fn error_field_wins_even_on_200() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": {"message": "model overloaded"}
            })),
        )
        .await;

        let backend = backend_for(&server, None);
        assert_eq!(
            backend.generate("p").await,
            Err(DispatchError::BackendError("model overloaded".into()))
        );
    }

    #[tokio::test]
    async fn bare_error_status_maps_to_backend_error() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(500)).await;

        let backend = backend_for(&server, None);
        match backend.generate("p").await {
            Err(DispatchError::BackendError(msg)) => assert!(msg.contains("500"), "got: {msg}"),
            other => panic!("expected BackendError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_transport_failure() {
        let server = MockServer::start().await;
        mount(&server, ResponseTemplate::new(200).set_body_string("not json {{{")).await;

        let backend = backend_for(&server, None);
        assert!(matches!(
            backend.generate("p").await,
            Err(DispatchError::TransportFailure(_))
        ));
    }

    #[tokio::test]
    async fn timeout_is_transport_failure() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_secs(3)),
        )
        .await;

        let backend = backend_for(&server, Some(1));
        match backend.generate("p").await {
            Err(DispatchError::TransportFailure(msg)) => {
                assert!(msg.contains("timed out"), "got: {msg}")
            }
            other => panic!("expected TransportFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_is_transport_failure_without_key() {
        // Reserve a free port, then release it so nothing is listening there.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = DocuMindConfig::builder()
            .endpoint(format!(
                "http://127.0.0.1:{port}/v1beta/models/m:generateContent?key=secret-key"
            ))
            .request_timeout_secs(5)
            .build()
            .unwrap();
        let backend = GeminiBackend::from_config(&config).unwrap();

        match backend.generate("p").await {
            Err(DispatchError::TransportFailure(msg)) => {
                assert!(!msg.contains("secret-key"), "key leaked: {msg}")
            }
            other => panic!("expected TransportFailure, got {other:?}"),
        }
    }
}
