//! Model Integration Layer
//!
//! Backend adapters plus the retry, timeout and cancellation plumbing
//! shared by generation and semantic linting.

pub mod backend;
pub mod cancel;
pub mod prompt;
pub mod retry;
pub mod timeout;
pub mod validation;

pub use backend::{
    Completion, CompletionRequest, HealthStatus, ModelBackend, OllamaBackend, OpenAiBackend,
    ResponseMetadata, ResponseTiming, SharedBackend, TokenUsage, create_backend,
};
pub use cancel::CancelToken;
pub use prompt::{PromptBuilder, PromptSection, PromptTemplates};
pub use retry::RetryPolicy;
pub use timeout::with_timeout;
pub use validation::{FindingsSchema, parse_findings, parse_json_response, strip_code_fences};
