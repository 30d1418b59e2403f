//! Backend Response Validation
//!
//! Strict checks for structured backend output:
//! - Markdown code fences around JSON are stripped
//! - Structure, field types and enum values are checked exactly
//! - Anything that does not match is rejected as `MalformedResponse`
//!
//! There is no repair step: a response either matches the schema or the
//! whole lint exchange fails.

mod extract;
mod findings;

pub use extract::{parse_json_response, strip_code_fences};
pub use findings::{FindingsSchema, parse_findings};
