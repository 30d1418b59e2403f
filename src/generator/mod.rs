//! Documentation Generator
//!
//! Turns a `CodeSummary` into a draft Markdown document through the model
//! backend. Generation has no persistence side effects; saving is a separate
//! step.

pub mod render;

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::ai::{
    CancelToken, CompletionRequest, PromptTemplates, RetryPolicy, SharedBackend,
    strip_code_fences,
};
use crate::config::GenerationConfig;
use crate::linter::RequiredSection;
use crate::linter::builtin_sections;
use crate::types::{CodeSummary, DocForgeError, DraftDocument, Repository, Result, short_hash};

const SYSTEM_PROMPT: &str = "You write accurate developer documentation in GitHub-flavored \
     Markdown. Only describe what the provided code summary supports.";

pub struct DocGenerator {
    backend: SharedBackend,
    retry: RetryPolicy,
    config: GenerationConfig,
    sections: Vec<String>,
}

impl DocGenerator {
    pub fn new(backend: SharedBackend, retry: RetryPolicy, config: GenerationConfig) -> Self {
        Self {
            backend,
            retry,
            config,
            sections: builtin_sections().into_iter().map(|s| s.name).collect(),
        }
    }

    /// Ask for the sections the linter will require
    pub fn with_required_sections(mut self, sections: &[RequiredSection]) -> Self {
        self.sections = sections.iter().map(|s| s.name.clone()).collect();
        self
    }

    /// Generate a draft for `repository` from `summary`.
    ///
    /// An empty summary fails with `EmptyRepository` before any backend call.
    /// The draft's fingerprint is the summary's fingerprint.
    #[instrument(skip_all, fields(repository = %repository.id, units = summary.len()))]
    pub async fn generate(
        &self,
        repository: &Repository,
        summary: &CodeSummary,
        cancel: &CancelToken,
    ) -> Result<DraftDocument> {
        if summary.is_empty() {
            return Err(DocForgeError::EmptyRepository {
                repository: repository.id.to_string(),
            });
        }

        let fingerprint = summary.fingerprint();
        let request =
            CompletionRequest::new(self.build_prompt(repository, summary)).with_system(SYSTEM_PROMPT);

        debug!(
            backend = self.backend.name(),
            model = self.backend.model(),
            fingerprint = short_hash(&fingerprint),
            prompt_chars = request.prompt.len(),
            "Requesting documentation"
        );

        let completion = cancel
            .run(
                "generate documentation",
                self.retry.complete(self.backend.as_ref(), &request),
            )
            .await?;

        let body = strip_code_fences(&completion.text);
        if body.is_empty() {
            return Err(DocForgeError::model(
                self.backend.model(),
                "backend returned an empty document",
            ));
        }

        let text = render::normalize(body, &repository.id, summary);
        info!(
            chars = text.len(),
            output_tokens = completion.usage.output_tokens,
            elapsed_ms = completion.timing.total_ms,
            "Draft generated"
        );

        Ok(DraftDocument::new(
            repository.id.clone(),
            text,
            Utc::now(),
            fingerprint,
        ))
    }

    fn build_prompt(&self, repository: &Repository, summary: &CodeSummary) -> String {
        let entry_points: Vec<&str> = summary.entry_points().map(|u| u.path.as_str()).collect();
        let entry_points = if entry_points.is_empty() {
            "None detected".to_string()
        } else {
            entry_points.join(", ")
        };

        let limit = self.config.max_prompt_units;
        let mut units: Vec<String> = summary
            .units
            .iter()
            .take(limit)
            .map(|unit| {
                let exports: Vec<&str> = unit.exports().collect();
                if exports.is_empty() {
                    format!("- {}", unit.path)
                } else {
                    format!("- {}: {}", unit.path, exports.join(", "))
                }
            })
            .collect();
        if summary.len() > limit {
            units.push(format!("- ... and {} more files", summary.len() - limit));
        }

        let endpoints: Vec<String> = summary
            .units
            .iter()
            .flat_map(|unit| unit.endpoints().map(move |e| format!("- {} ({})", e, unit.path)))
            .collect();
        let endpoints = if endpoints.is_empty() {
            "None detected".to_string()
        } else {
            endpoints.join("\n")
        };

        let title_rule = format!(
            "Start with the title '{}'",
            render::title_for(&repository.id)
        );
        let sections_rule = format!(
            "Include these level-2 sections in this order: {}",
            self.sections.join(", ")
        );
        let mut rules = vec![
            title_rule.as_str(),
            sections_rule.as_str(),
            "Give the Overview at least three sentences of prose",
            "Output Markdown only, without wrapping it in a code fence",
        ];
        if summary.has_endpoints() {
            rules.push("Add an '## Endpoints' section with a subsection per endpoint listed above");
        }
        if let Some(extra) = &self.config.instructions {
            rules.push(extra.as_str());
        }

        PromptTemplates::documentation(repository.id.as_str())
            .context_item("Repository", repository.id.as_str())
            .context_item("Default branch", &repository.default_branch)
            .context_item("Source files", &summary.len().to_string())
            .context_item("Entry points", &entry_points)
            .section("Source files and exported symbols", &units.join("\n"))
            .section("HTTP endpoints", &endpoints)
            .rules(rules)
            .build()
    }
}
