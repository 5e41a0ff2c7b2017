//! Configuration for extraction and dispatch.
//!
//! Every knob lives in [`DocuMindConfig`], built through
//! [`DocuMindConfigBuilder`] or read from the environment with
//! [`DocuMindConfig::from_env`]. The endpoint is fixed once the config is
//! built; nothing changes it at runtime.

use crate::error::ConfigError;
use crate::progress::ExtractionProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Base URL of the Gemini REST API.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Model used when only `GEMINI_API_KEY` is set.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Word limit pre-filled for summaries.
pub const DEFAULT_WORD_LIMIT: u32 = 100;

/// Build the `generateContent` URL for a Gemini model.
pub fn gemini_endpoint(model: &str, api_key: &str) -> String {
    format!("{GEMINI_API_BASE}/{model}:generateContent?key={api_key}")
}

/// Configuration shared by the extractor, the backend and the session.
///
/// # Example
/// ```rust
/// use documind::{DocuMindConfig, ImageReferenceStyle};
///
/// let config = DocuMindConfig::builder()
///     .endpoint("https://example.com/v1/models/m:generateContent?key=abc")
///     .request_timeout_secs(30)
///     .image_reference(ImageReferenceStyle::Placeholder)
///     .build()
///     .unwrap();
/// assert_eq!(config.request_timeout_secs, Some(30));
/// ```
#[derive(Clone)]
pub struct DocuMindConfig {
    /// Full URL of the text-generation endpoint, including any key parameter.
    pub endpoint: String,

    /// Per-request timeout. `None` waits for as long as the backend takes.
    pub request_timeout_secs: Option<u64>,

    /// How page images are referenced in the prompt. Default: data URIs.
    pub image_reference: ImageReferenceStyle,

    /// User password for encrypted PDFs.
    pub password: Option<String>,

    /// Word limit used when the caller does not give one. Default: 100.
    pub default_word_limit: u32,

    /// Receives page-by-page extraction events.
    pub progress_callback: Option<Arc<dyn ExtractionProgressCallback>>,
}

impl Default for DocuMindConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            request_timeout_secs: None,
            image_reference: ImageReferenceStyle::default(),
            password: None,
            default_word_limit: DEFAULT_WORD_LIMIT,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for DocuMindConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocuMindConfig")
            .field("endpoint", &redact_endpoint(&self.endpoint))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("image_reference", &self.image_reference)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("default_word_limit", &self.default_word_limit)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl DocuMindConfig {
    pub fn builder() -> DocuMindConfigBuilder {
        DocuMindConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a config from environment variables.
    ///
    /// | Variable | Meaning |
    /// |----------|---------|
    /// | `DOCUMIND_ENDPOINT` | full endpoint URL; wins over everything else |
    /// | `GEMINI_API_KEY` | key for the Gemini endpoint when no URL is given |
    /// | `DOCUMIND_MODEL` | Gemini model, default `gemini-2.0-flash` |
    /// | `DOCUMIND_TIMEOUT_SECS` | request timeout in seconds |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let endpoint = match non_empty("DOCUMIND_ENDPOINT") {
            Some(url) => url,
            None => {
                let key = non_empty("GEMINI_API_KEY").ok_or(ConfigError::MissingEndpoint)?;
                let model =
                    non_empty("DOCUMIND_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
                gemini_endpoint(&model, &key)
            }
        };

        let mut builder = Self::builder().endpoint(endpoint);
        if let Some(raw) = non_empty("DOCUMIND_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "DOCUMIND_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
                ))
            })?;
            builder = builder.request_timeout_secs(secs);
        }
        builder.build()
    }

    /// The endpoint with any `key=` query value masked, safe for logs.
    pub fn redacted_endpoint(&self) -> String {
        redact_endpoint(&self.endpoint)
    }
}

/// Builder for [`DocuMindConfig`].
#[derive(Debug)]
pub struct DocuMindConfigBuilder {
    config: DocuMindConfig,
}

impl DocuMindConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn image_reference(mut self, style: ImageReferenceStyle) -> Self {
        self.config.image_reference = style;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn default_word_limit(mut self, words: u32) -> Self {
        self.config.default_word_limit = words;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn ExtractionProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DocuMindConfig, ConfigError> {
        let c = &self.config;
        if c.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        match reqwest::Url::parse(&c.endpoint) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(ConfigError::InvalidEndpoint {
                    endpoint: redact_endpoint(&c.endpoint),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                })
            }
            Err(e) => {
                return Err(ConfigError::InvalidEndpoint {
                    endpoint: redact_endpoint(&c.endpoint),
                    reason: e.to_string(),
                })
            }
        }
        if c.request_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "request timeout must be at least 1 second".into(),
            ));
        }
        if c.default_word_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "default word limit must be at least 1".into(),
            ));
        }
        Ok(self.config)
    }
}

/// How extracted page images appear in the prompt.
///
/// The backend only ever receives text; either way the images are opaque
/// references, not something the model decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageReferenceStyle {
    /// The full `data:image/png;base64,...` URI of every page.
    #[default]
    DataUri,
    /// A short `[page N: WxH PNG, B bytes]` marker per page.
    Placeholder,
}

/// Mask the value of a `key` query parameter.
fn redact_endpoint(endpoint: &str) -> String {
    let Ok(mut url) = reqwest::Url::parse(endpoint) else {
        return endpoint.to_string();
    };
    if !url.query_pairs().any(|(k, _)| k == "key") {
        return endpoint.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}
