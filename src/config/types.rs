//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/docforge/) and project (.docforge/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{analysis, generation, lint, network, retry};
use crate::types::{DocForgeError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Model backend settings
    pub backend: BackendConfig,

    /// Retry policy for backend calls
    pub retry: RetryConfig,

    /// Linter settings
    pub lint: LintConfig,

    /// Repository source settings
    pub repositories: RepositoriesConfig,

    /// Code analysis settings
    pub analysis: AnalysisConfig,

    /// Document generation settings
    pub generation: GenerationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            backend: BackendConfig::default(),
            retry: RetryConfig::default(),
            lint: LintConfig::default(),
            repositories: RepositoriesConfig::default(),
            analysis: AnalysisConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `DocForgeError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.backend.provider.as_str(), "ollama" | "openai") {
            return Err(DocForgeError::Config(format!(
                "Unknown backend provider: {}. Supported: ollama, openai",
                self.backend.provider
            )));
        }

        if !(0.0..=2.0).contains(&self.backend.temperature) {
            return Err(DocForgeError::Config(format!(
                "Backend temperature must be between 0.0 and 2.0, got {}",
                self.backend.temperature
            )));
        }

        if self.backend.timeout_secs == 0 {
            return Err(DocForgeError::Config(
                "Backend timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.backend.model.trim().is_empty() {
            return Err(DocForgeError::Config(
                "Backend model must not be empty".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 || self.retry.max_attempts > retry::MAX_CONFIGURABLE_ATTEMPTS
        {
            return Err(DocForgeError::Config(format!(
                "Retry max_attempts must be between 1 and {}, got {}",
                retry::MAX_CONFIGURABLE_ATTEMPTS,
                self.retry.max_attempts
            )));
        }

        if self.retry.factor < 1.0 {
            return Err(DocForgeError::Config(format!(
                "Retry factor must be at least 1.0, got {}",
                self.retry.factor
            )));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(DocForgeError::Config(
                "Retry base_delay_ms must not exceed max_delay_ms".to_string(),
            ));
        }

        if self.generation.max_prompt_units == 0 {
            return Err(DocForgeError::Config(
                "Generation max_prompt_units must be greater than 0".to_string(),
            ));
        }

        if self.lint.max_semantic_findings == 0 {
            return Err(DocForgeError::Config(
                "Lint max_semantic_findings must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Backend Configuration
// =============================================================================

/// Configuration for the model backend
///
/// Note: API keys are never serialized to output and are redacted in debug
/// output. The OpenAI backend converts the key to a SecretString internally.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Provider type: "ollama", "openai"
    pub provider: String,
    /// Base endpoint URL
    pub endpoint: Option<String>,
    /// Model identifier
    pub model: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Temperature for generation (0.0 = deterministic)
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: usize,
    /// API key (OpenAI-compatible endpoints)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: None,
            model: "llama3:latest".to_string(),
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: 0.0,
            max_tokens: 4096,
            api_key: None,
        }
    }
}

impl BackendConfig {
    /// Endpoint with the provider's default applied
    pub fn endpoint_or_default(&self) -> &str {
        match (&self.endpoint, self.provider.as_str()) {
            (Some(endpoint), _) => endpoint,
            (None, "openai") => network::DEFAULT_OPENAI_ENDPOINT,
            (None, _) => network::DEFAULT_OLLAMA_ENDPOINT,
        }
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first call
    pub max_attempts: u32,
    /// First backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Upper bound on a single backoff delay in milliseconds
    pub max_delay_ms: u64,
    /// Backoff multiplier
    pub factor: f32,
    /// Add random jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: retry::BASE_DELAY_MS,
            max_delay_ms: retry::MAX_DELAY_MS,
            factor: retry::BACKOFF_FACTOR,
            jitter: true,
        }
    }
}

// =============================================================================
// Lint Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Run the model-backed semantic pass after structural checks
    pub semantic: bool,
    /// Sections required in addition to Overview, Installation and API Reference
    pub required_sections: Vec<String>,
    /// Minimum words in the Overview body
    pub min_overview_words: usize,
    /// Maximum findings accepted from the semantic pass
    pub max_semantic_findings: usize,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            semantic: true,
            required_sections: Vec::new(),
            min_overview_words: lint::MIN_OVERVIEW_WORDS,
            max_semantic_findings: lint::MAX_SEMANTIC_FINDINGS,
        }
    }
}

// =============================================================================
// Repository Source Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoriesConfig {
    /// Directory containing `<owner>/<name>` checkouts
    pub root: Option<PathBuf>,
    /// Branch reported when `.git/HEAD` cannot be read
    pub default_branch: String,
    /// Explicitly registered repositories
    pub entries: Vec<RepositoryEntry>,
}

impl Default for RepositoriesConfig {
    fn default() -> Self {
        Self {
            root: None,
            default_branch: "main".to_string(),
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryEntry {
    /// `owner/name`
    pub id: String,
    pub path: PathBuf,
    #[serde(default)]
    pub branch: Option<String>,
}

// =============================================================================
// Analysis Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Glob patterns to exclude (relative to the repository root)
    pub exclude: Vec<String>,

    /// Maximum file size in bytes
    pub max_file_size: u64,

    /// Maximum source units per summary
    pub max_units: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            exclude: vec![
                "node_modules/**".to_string(),
                "dist/**".to_string(),
                ".git/**".to_string(),
                "target/**".to_string(),
                "vendor/**".to_string(),
                "__pycache__/**".to_string(),
                ".venv/**".to_string(),
                "build/**".to_string(),
            ],
            max_file_size: analysis::MAX_FILE_SIZE,
            max_units: analysis::MAX_UNITS,
        }
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Units listed individually in the prompt; the rest are counted
    pub max_prompt_units: usize,
    /// Extra instructions appended to every generation prompt
    pub instructions: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_prompt_units: generation::MAX_PROMPT_UNITS,
            instructions: None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
