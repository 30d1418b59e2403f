//! OpenAI-compatible Backend
//!
//! Backend using the Chat Completions API of OpenAI or any compatible server.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::{
    Completion, CompletionRequest, HealthStatus, ModelBackend, ResponseMetadata, ResponseTiming,
    TokenUsage, build_client, validate_endpoint,
};
use crate::config::BackendConfig;
use crate::constants::network;
use crate::types::{DocForgeError, ErrorClassifier, Result};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a technical writer producing accurate Markdown documentation for software repositories.";

/// OpenAI-compatible backend with secure API key handling
pub struct OpenAiBackend {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                DocForgeError::Config(
                    "OpenAI API key not found. Set OPENAI_API_KEY env var or backend.api_key in config"
                        .to_string(),
                )
            })?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            endpoint: validate_endpoint(config.endpoint_or_default())?,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client: build_client(config.timeout_secs)?,
        })
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        let system = request
            .system
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            response_format: request.json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        info!(
            model = %self.model,
            json_mode = request.json_mode,
            "Requesting completion from OpenAI-compatible endpoint"
        );

        let start_time = Instant::now();
        let url = format!("{}/chat/completions", self.endpoint);

        debug!(url = %url, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, &self.endpoint, &self.model))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &body,
                &self.endpoint,
                &self.model,
            ));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, &self.endpoint, &self.model))?;

        let usage = body
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| DocForgeError::model(&self.model, "no content in response"))?;

        Ok(Completion {
            text,
            usage,
            timing: ResponseTiming::from_duration(start_time.elapsed()),
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: "openai".to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        let url = format!("{}/models", self.endpoint);
        let mut status = HealthStatus {
            provider: "openai".to_string(),
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            reachable: false,
            model_available: false,
            detail: String::new(),
        };

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .timeout(std::time::Duration::from_secs(
                network::HEALTH_CHECK_TIMEOUT_SECS,
            ))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                status.reachable = true;
                match resp.json::<ModelList>().await {
                    Ok(list) => {
                        status.model_available = list.data.iter().any(|m| m.id == self.model);
                        status.detail = if status.model_available {
                            "model available".to_string()
                        } else {
                            format!("model '{}' not listed by endpoint", self.model)
                        };
                    }
                    Err(e) => status.detail = format!("could not read model list: {}", e),
                }
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "OpenAI API check failed");
                status.reachable = true;
                status.detail = format!("HTTP {}", resp.status());
            }
            Err(e) => {
                warn!(error = %e, "OpenAI API check failed");
                status.detail = format!("unreachable: {}", e);
            }
        }

        Ok(status)
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}
