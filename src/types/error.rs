//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Backend failures are split into two kinds so callers can route them:
//!
//! - **Connection**: endpoint unreachable, timed out, or answering with 5xx (retry)
//! - **Model**: endpoint reachable but the model rejected or failed the request (surface)
//!
//! Everything else surfaces immediately with the step and repository attached
//! by the pipeline.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Pipeline Steps
// =============================================================================

/// Pipeline step names used as error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Fetch,
    Analyze,
    Generate,
    Lint,
    Save,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch"),
            Self::Analyze => write!(f, "analyze"),
            Self::Generate => write!(f, "generate"),
            Self::Lint => write!(f, "lint"),
            Self::Save => write!(f, "save"),
        }
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps transport-level observations onto `Connection` or `Model` errors
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an HTTP status returned by a reachable endpoint.
    ///
    /// Any 5xx status is a server-side failure and counts as a connection
    /// failure, which the retry policy tries again. Other non-2xx statuses are
    /// the model side refusing the request and surface immediately.
    pub fn classify_http_status(
        status: u16,
        body: &str,
        endpoint: &str,
        model: &str,
    ) -> DocForgeError {
        let message = format!("HTTP {}: {}", status, truncate_preview(body, 300));
        match status {
            500..=599 => DocForgeError::connection(endpoint, message),
            _ => DocForgeError::model(model, message),
        }
    }

    /// Classify a reqwest transport error
    pub fn classify_transport(err: &reqwest::Error, endpoint: &str, model: &str) -> DocForgeError {
        if err.is_connect() {
            DocForgeError::connection(
                endpoint,
                format!("endpoint unreachable: {}", err),
            )
        } else if err.is_timeout() {
            DocForgeError::connection(endpoint, format!("request timed out: {}", err))
        } else if err.is_decode() || err.is_body() {
            DocForgeError::model(model, format!("invalid response body: {}", err))
        } else if err.is_request() {
            DocForgeError::connection(endpoint, format!("request failed: {}", err))
        } else {
            DocForgeError::model(model, err.to_string())
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum DocForgeError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    /// Endpoint unreachable, timed out or unavailable
    #[error("Cannot reach model backend at {endpoint}: {message}")]
    Connection { endpoint: String, message: String },

    /// Endpoint reachable but the model rejected or failed the request
    #[error("Model '{model}' failed: {message}")]
    Model { model: String, message: String },

    /// Transient failures persisted through every retry
    #[error("Model backend failed after {attempts} attempt(s): {source}")]
    GenerationBackend {
        attempts: u32,
        #[source]
        source: Box<DocForgeError>,
    },

    /// Backend returned lint output that does not match the findings schema
    #[error("Malformed backend response: {message} (response: {preview})")]
    MalformedResponse { message: String, preview: String },

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Cancelled: {operation}")]
    Cancelled { operation: String },

    // -------------------------------------------------------------------------
    // Pipeline Errors
    // -------------------------------------------------------------------------
    #[error("Repository {repository} has no source units to document")]
    EmptyRepository { repository: String },

    /// Lint result computed for content that has since changed
    #[error("Lint result for content {expected} is stale (current content {actual})")]
    StaleFindings { expected: String, actual: String },

    /// Step/repository context attached by the pipeline
    #[error("{step} failed for {repository}: {source}")]
    Step {
        step: PipelineStep,
        repository: String,
        #[source]
        source: Box<DocForgeError>,
    },

    /// A lint pass reported error-severity findings
    #[error("Lint found {errors} error(s) and {warnings} warning(s)")]
    LintFailed { errors: usize, warnings: usize },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("Invalid repository id '{id}': {reason}")]
    InvalidRepositoryId { id: String, reason: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not initialized: run 'docforge init' first")]
    NotInitialized,
}

pub type Result<T> = std::result::Result<T, DocForgeError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl DocForgeError {
    /// Create a connection error
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a model error
    pub fn model(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Model {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Create a malformed response error with a short preview of the raw text
    pub fn malformed(message: impl Into<String>, raw: &str) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            preview: truncate_preview(raw, 200),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a cancellation error
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Attach pipeline step and repository context
    pub fn at_step(self, step: PipelineStep, repository: impl Into<String>) -> Self {
        Self::Step {
            step,
            repository: repository.into(),
            source: Box::new(self),
        }
    }

    /// Strip step context wrappers
    pub fn root_cause(&self) -> &DocForgeError {
        match self {
            Self::Step { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Transient failures that the retry policy may try again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::Connection { .. } | Self::Timeout { .. }
        )
    }

    /// Failures reported by a reachable model
    pub fn is_model_error(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::Model { .. } | Self::MalformedResponse { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), Self::Cancelled { .. })
    }
}

impl From<figment::Error> for DocForgeError {
    fn from(err: figment::Error) -> Self {
        DocForgeError::Config(format!("Configuration error: {}", err))
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| DocForgeError::Storage(format!("{}: {}", context.into(), e)))
    }
}

fn truncate_preview(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut preview: String = trimmed.chars().take(max_chars).collect();
    preview.push_str("...");
    preview
}

// =============================================================================
// Tests
// =============================================================================
