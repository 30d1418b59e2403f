//! Ollama Local Model Backend
//!
//! Backend for locally-running Ollama models via `/api/generate`.

use async_trait::async_trait;
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

/// Ollama Local Model Backend
pub struct OllamaBackend {
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let endpoint = validate_endpoint(config.endpoint_or_default())?;

        Ok(Self {
            endpoint,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client: build_client(config.timeout_secs)?,
        })
    }

    fn build_request(&self, request: &CompletionRequest) -> OllamaRequest {
        OllamaRequest {
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
            format: request.json_mode.then(|| "json".to_string()),
        }
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        info!(
            model = %self.model,
            json_mode = request.json_mode,
            "Requesting completion from Ollama"
        );

        let start_time = Instant::now();
        let url = format!("{}/api/generate", self.endpoint);

        debug!(url = %url, prompt_chars = request.prompt.len(), "Sending request to Ollama API");

        let response = self
            .client
            .post(&url)
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

        let body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, &self.endpoint, &self.model))?;

        if let Some(error) = body.error {
            return Err(DocForgeError::model(&self.model, error));
        }

        let text = body.response.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(DocForgeError::model(&self.model, "empty response"));
        }

        let elapsed = start_time.elapsed();
        debug!(elapsed_ms = elapsed.as_millis() as u64, "Received response from Ollama");

        Ok(Completion {
            text,
            usage: TokenUsage::new(
                body.prompt_eval_count.unwrap_or(0),
                body.eval_count.unwrap_or(0),
            ),
            timing: ResponseTiming::from_duration(elapsed),
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: "ollama".to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        let url = format!("{}/api/tags", self.endpoint);
        let mut status = HealthStatus {
            provider: "ollama".to_string(),
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            reachable: false,
            model_available: false,
            detail: String::new(),
        };

        let response = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(
                network::HEALTH_CHECK_TIMEOUT_SECS,
            ))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                status.reachable = true;
                match resp.json::<OllamaTagsResponse>().await {
                    Ok(tags) => {
                        let base = self.model.trim_end_matches(":latest");
                        status.model_available = tags
                            .models
                            .iter()
                            .any(|m| m.name == self.model || m.name.starts_with(base));
                        if status.model_available {
                            info!(model = %self.model, "Ollama is available");
                            status.detail = "model available".to_string();
                        } else {
                            warn!(model = %self.model, "Ollama is running but model not found");
                            status.detail = format!(
                                "model '{}' not found. Pull with: ollama pull {}",
                                self.model, self.model
                            );
                        }
                    }
                    Err(e) => {
                        status.detail = format!("could not read model list: {}", e);
                    }
                }
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "Ollama API check failed");
                status.reachable = true;
                status.detail = format!("HTTP {}", resp.status());
            }
            Err(e) => {
                warn!(error = %e, "Ollama not available");
                status.detail = format!("unreachable: {}. Start with: ollama serve", e);
            }
        }

        Ok(status)
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    options: OllamaOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the base URL
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = vec![0u8; 16 * 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}", addr)
    }

    fn backend_for(endpoint: String) -> OllamaBackend {
        OllamaBackend::new(&BackendConfig {
            endpoint: Some(endpoint),
            timeout_secs: 5,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let backend = OllamaBackend::new(&BackendConfig::default()).unwrap();
        assert_eq!(backend.endpoint, "http://localhost:11434");
        assert_eq!(backend.model, "llama3:latest");
    }

    #[test]
    fn test_json_mode_sets_format() {
        let backend = OllamaBackend::new(&BackendConfig::default()).unwrap();
        let plain = backend.build_request(&CompletionRequest::new("x"));
        assert!(plain.format.is_none());
        let json = backend.build_request(&CompletionRequest::new("x").json());
        assert_eq!(json.format.as_deref(), Some("json"));
    }

    #[tokio::test]
    async fn test_complete_success() {
        let endpoint = serve_once(
            "200 OK",
            r##"{"response":"# Docs","prompt_eval_count":12,"eval_count":3}"##,
        )
        .await;
        let completion = backend_for(endpoint)
            .complete(&CompletionRequest::new("write docs"))
            .await
            .unwrap();
        assert_eq!(completion.text, "# Docs");
        assert_eq!(completion.usage.total(), 15);
        assert_eq!(completion.metadata.provider, "ollama");
    }

    #[tokio::test]
    async fn test_gateway_status_is_connection_error() {
        let endpoint = serve_once("503 Service Unavailable", "{}").await;
        let err = backend_for(endpoint)
            .complete(&CompletionRequest::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocForgeError::Connection { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_not_found_status_is_model_error() {
        let endpoint = serve_once("404 Not Found", r#"{"error":"model not found"}"#).await;
        let err = backend_for(endpoint)
            .complete(&CompletionRequest::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocForgeError::Model { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_response_is_model_error() {
        let endpoint = serve_once("200 OK", r#"{"response":"   "}"#).await;
        let err = backend_for(endpoint)
            .complete(&CompletionRequest::new("x"))
            .await
            .unwrap_err();
        assert!(err.is_model_error());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = backend_for(format!("http://{}", addr))
            .complete(&CompletionRequest::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocForgeError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_health_check_reports_model() {
        let endpoint = serve_once(
            "200 OK",
            r#"{"models":[{"name":"llama3:latest"},{"name":"mistral:7b"}]}"#,
        )
        .await;
        let status = backend_for(endpoint).health_check().await.unwrap();
        assert!(status.reachable);
        assert!(status.model_available);
        assert!(status.is_ready());
    }
}
