//! Model Backend Abstraction
//!
//! Defines the `ModelBackend` trait: one prompt in, one completion out.
//! Backends are pure request/response adapters with no caching or retry;
//! retry and cancellation are layered on top by `ai::retry` and `ai::cancel`.
//!
//! Every failure is classified as either `Connection` (retryable) or
//! `Model` (surfaced immediately) via `ErrorClassifier`.

mod ollama;
mod openai;
#[cfg(test)]
pub(crate) mod scripted;

pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::BackendConfig;
use crate::types::{DocForgeError, Result};

// =============================================================================
// Request / Completion
// =============================================================================

/// A single prompt submitted to the backend
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// System instructions, when the backend supports them
    pub system: Option<String>,
    /// User prompt
    pub prompt: String,
    /// Ask the backend to constrain output to a JSON object
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// Backend answer with usage metrics
#[derive(Debug, Clone)]
pub struct Completion {
    /// Raw generated text
    pub text: String,
    pub usage: TokenUsage,
    pub timing: ResponseTiming,
    pub metadata: ResponseMetadata,
}

impl Completion {
    /// Completion with text only (usage unknown)
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: TokenUsage::default(),
            timing: ResponseTiming::default(),
            metadata: ResponseMetadata::default(),
        }
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens (prompt)
    pub input_tokens: u32,
    /// Output tokens (response)
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Total tokens used (input + output)
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Response timing metrics
#[derive(Debug, Clone, Default)]
pub struct ResponseTiming {
    /// Total response time in milliseconds (wall clock)
    pub total_ms: u64,
}

impl ResponseTiming {
    pub fn from_duration(duration: Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
        }
    }
}

/// Response metadata
#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    pub model: String,
    pub provider: String,
}

/// Result of a reachability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    /// Endpoint answered
    pub reachable: bool,
    /// Configured model is listed by the endpoint
    pub model_available: bool,
    pub detail: String,
}

impl HealthStatus {
    pub fn is_ready(&self) -> bool {
        self.reachable && self.model_available
    }
}

// =============================================================================
// Backend Trait
// =============================================================================

/// Model backend: request/response to a model-serving endpoint
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Submit one prompt and return the raw completion text
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model identifier currently in use
    fn model(&self) -> &str;

    /// Base endpoint URL
    fn endpoint(&self) -> &str;

    /// Check the endpoint and model availability
    async fn health_check(&self) -> Result<HealthStatus>;
}

/// Shared backend for concurrent pipelines
pub type SharedBackend = Arc<dyn ModelBackend>;

/// Create a shared backend from configuration
pub fn create_backend(config: &BackendConfig) -> Result<SharedBackend> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaBackend::new(config)?)),
        "openai" => Ok(Arc::new(OpenAiBackend::new(config)?)),
        other => Err(DocForgeError::Config(format!(
            "Unknown backend provider: {}. Supported: ollama, openai",
            other
        ))),
    }
}

/// Validate endpoint URL for security (SSRF prevention)
///
/// Only allows http/https schemes and warns for non-localhost endpoints.
pub(crate) fn validate_endpoint(endpoint: &str) -> Result<String> {
    let url = url::Url::parse(endpoint).map_err(|e| {
        DocForgeError::Config(format!("Invalid backend endpoint URL '{}': {}", endpoint, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(DocForgeError::Config(format!(
            "Backend endpoint must use http or https scheme, got: {}",
            url.scheme()
        )));
    }

    if let Some(host) = url.host_str()
        && !matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]")
    {
        tracing::warn!(
            host,
            "Backend endpoint is not localhost. Ensure this is intentional."
        );
    }

    let mut result = url.to_string();
    if result.ends_with('/') {
        result.pop();
    }
    Ok(result)
}

pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(
            crate::constants::network::CONNECT_TIMEOUT_SECS.min(timeout_secs),
        ))
        .build()
        .map_err(|e| DocForgeError::Config(format!("Failed to create HTTP client: {}", e)))
}
