//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Retry policy constants for backend calls
pub mod retry {
    /// Total attempts including the first call
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (milliseconds)
    pub const MAX_DELAY_MS: u64 = 10_000;

    /// Backoff multiplier
    pub const BACKOFF_FACTOR: f32 = 2.0;

    /// Hard ceiling on configured attempts
    pub const MAX_CONFIGURABLE_ATTEMPTS: u32 = 10;
}

/// HTTP/Network constants
pub mod network {
    /// Default Ollama endpoint
    pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

    /// Default OpenAI-compatible endpoint
    pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Connection establishment timeout (seconds)
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Health check timeout (seconds)
    pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;
}

/// Lint constants
pub mod lint {
    /// Minimum words expected in the Overview section body
    pub const MIN_OVERVIEW_WORDS: usize = 15;

    /// Maximum findings accepted from one semantic pass
    pub const MAX_SEMANTIC_FINDINGS: usize = 50;

    /// Maximum document characters sent for semantic review
    pub const MAX_REVIEW_CHARS: usize = 48_000;
}

/// Code analysis constants
pub mod analysis {
    /// Maximum file size to analyze (1MB)
    pub const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Maximum source units kept in one summary
    pub const MAX_UNITS: usize = 2_000;

    /// Maximum symbols recorded per unit
    pub const MAX_SYMBOLS_PER_UNIT: usize = 64;
}

/// Generation constants
pub mod generation {
    /// Maximum units listed in full inside a generation prompt
    pub const MAX_PROMPT_UNITS: usize = 200;
}
