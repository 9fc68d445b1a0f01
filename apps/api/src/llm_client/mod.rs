/// LLM Client — the single point of entry for all generative-model calls.
///
/// ARCHITECTURAL RULE: No other module may call the provider API directly.
/// Pipeline stages talk to a `GenerativeProvider`; `GeminiClient` is the
/// production implementation, tests inject their own.
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod gemini;
pub mod prompts;

pub use gemini::GeminiClient;

/// Generation method a catalog model must advertise to be usable for free-form text.
pub const GENERATE_CONTENT: &str = "generateContent";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Cannot instantiate model '{model}': {reason}")]
    Instantiate { model: String, reason: String },
}

/// Credentials and transport settings for a provider, scoped to one pipeline instance.
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub api_base: String,
    /// Transport-level request timeout. The pipeline itself imposes none.
    pub timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A model identifier that has been selected or instantiated, without any provider prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Builds an identifier from a catalog name, dropping any `models/` style prefix.
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        let short = name.rsplit('/').next().unwrap_or(name);
        Self(short.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the provider's model catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogModel {
    pub name: String,
    pub supported_generation_methods: Vec<String>,
}

impl CatalogModel {
    pub fn supports_generation(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == GENERATE_CONTENT)
    }

    pub fn id(&self) -> ModelId {
        ModelId::new(&self.name)
    }
}

/// Abstraction over a generative-model provider.
///
/// Every call is a single request/response exchange; no session state is kept
/// between calls.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Lists the models visible to the configured credentials.
    async fn list_models(&self) -> Result<Vec<CatalogModel>, LlmError>;

    /// Constructs a local handle for `model` without invoking it.
    fn instantiate(&self, model: &str) -> Result<ModelId, LlmError>;

    /// Runs one single-shot generation and returns the text of the response.
    async fn generate(&self, model: &ModelId, prompt: &str) -> Result<String, LlmError>;
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
///
/// Only the body of the first fenced block is kept; anything after its
/// closing fence is discarded.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(stripped) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```JSON"))
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    match stripped.find("```") {
        Some(end) => stripped[..end].trim(),
        None => stripped.trim(),
    }
}

/// Cuts `text` to at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
