//! Documentation Linter
//!
//! Structural rules run first, synchronously and without failing. When a
//! backend is configured the semantic pass runs afterwards and its findings
//! are appended in the order the backend returned them.

pub mod markdown;
pub mod reporter;
pub mod rules;
pub mod semantic;

pub use markdown::{Heading, Outline};
pub use reporter::Reporter;
pub use rules::{RequiredSection, RuleSet, builtin_sections};
pub use semantic::SemanticReviewer;

use tracing::{debug, instrument};

use crate::ai::{CancelToken, FindingsSchema, RetryPolicy, SharedBackend};
use crate::config::LintConfig;
use crate::types::{LintFinding, LintReport, Result, sha256_hex, short_hash};

pub struct Linter {
    rules: RuleSet,
    semantic: Option<SemanticReviewer>,
}

impl Linter {
    /// Structural rules only; never calls a backend
    pub fn structural_only(config: &LintConfig) -> Self {
        Self {
            rules: RuleSet::new(config),
            semantic: None,
        }
    }

    /// Structural rules plus the semantic pass when `config.semantic` is set
    pub fn with_backend(config: &LintConfig, backend: SharedBackend, retry: RetryPolicy) -> Self {
        let semantic = config.semantic.then(|| {
            SemanticReviewer::new(
                backend,
                retry,
                FindingsSchema::new(config.max_semantic_findings),
            )
        });
        Self {
            rules: RuleSet::new(config),
            semantic,
        }
    }

    pub fn has_semantic_pass(&self) -> bool {
        self.semantic.is_some()
    }

    /// Pure structural pass
    pub fn structural(&self, text: &str) -> Vec<LintFinding> {
        self.rules.check(text)
    }

    /// Full lint pass over `text`, tagged with its content hash.
    ///
    /// Empty text yields the single "document is empty" error without any
    /// backend call. A failed semantic pass fails the whole lint.
    #[instrument(skip(self, text, cancel), fields(chars = text.len()))]
    pub async fn lint(&self, text: &str, cancel: &CancelToken) -> Result<LintReport> {
        let content_hash = sha256_hex(text);
        let mut findings = self.structural(text);

        if text.trim().is_empty() {
            return Ok(LintReport::new(content_hash, findings));
        }

        if let Some(semantic) = &self.semantic {
            let extra = semantic.review(text, &findings, cancel).await?;
            findings.extend(extra);
        }

        debug!(
            content = short_hash(&content_hash),
            findings = findings.len(),
            "Lint pass complete"
        );
        Ok(LintReport::new(content_hash, findings))
    }
}
