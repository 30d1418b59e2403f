//! Documentation Pipeline
//!
//! ```text
//! fetch → analyze → generate → (lint) → (save)
//! ```
//!
//! Steps within one pipeline run strictly in order. Pipelines for different
//! repositories share no mutable state and run concurrently in `run_many`.
//! Every error leaving a pipeline names the step and repository it came from.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::ai::CancelToken;
use crate::analyzer::CodeAnalyzer;
use crate::generator::DocGenerator;
use crate::linter::Linter;
use crate::repository::RepositorySource;
use crate::storage::VersionStore;
use crate::types::{
    CodeSummary, DocForgeError, DraftDocument, LintReport, NewVersion, PipelineStep, Repository,
    RepositoryId, Result, VersionRecord,
};

/// Everything one pipeline run produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub repository: Repository,
    pub summary: CodeSummary,
    pub document: DraftDocument,
    /// Present when a linter was configured
    pub report: Option<LintReport>,
    /// Present when a version store was configured
    pub version: Option<VersionRecord>,
}

pub struct Pipeline {
    source: Arc<dyn RepositorySource>,
    analyzer: Arc<CodeAnalyzer>,
    generator: Arc<DocGenerator>,
    linter: Option<Arc<Linter>>,
    store: Option<Arc<dyn VersionStore>>,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn RepositorySource>,
        analyzer: CodeAnalyzer,
        generator: DocGenerator,
    ) -> Self {
        Self {
            source,
            analyzer: Arc::new(analyzer),
            generator: Arc::new(generator),
            linter: None,
            store: None,
        }
    }

    /// Lint each draft after generation
    pub fn with_linter(mut self, linter: Linter) -> Self {
        self.linter = Some(Arc::new(linter));
        self
    }

    /// Save each draft as a new version
    pub fn with_store(mut self, store: Arc<dyn VersionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Run every step for one repository
    #[instrument(skip_all, fields(repository = %id))]
    pub async fn run(&self, id: &RepositoryId, cancel: &CancelToken) -> Result<PipelineOutput> {
        let at = move |step: PipelineStep| move |e: DocForgeError| e.at_step(step, id.as_str());

        cancel.check("fetch").map_err(at(PipelineStep::Fetch))?;
        let repository = self.source.fetch(id).map_err(at(PipelineStep::Fetch))?;

        cancel.check("analyze").map_err(at(PipelineStep::Analyze))?;
        let summary = self
            .analyze(repository.clone())
            .await
            .map_err(at(PipelineStep::Analyze))?;
        info!(
            units = summary.len(),
            symbols = summary.symbol_count(),
            "Analysis complete"
        );

        let document = self
            .generator
            .generate(&repository, &summary, cancel)
            .await
            .map_err(at(PipelineStep::Generate))?;

        let report = match &self.linter {
            Some(linter) => Some(
                linter
                    .lint(document.text(), cancel)
                    .await
                    .map_err(at(PipelineStep::Lint))?,
            ),
            None => None,
        };

        let version = match &self.store {
            Some(store) => {
                cancel.check("save").map_err(at(PipelineStep::Save))?;
                Some(
                    save(store.clone(), NewVersion::from_document(&document))
                        .await
                        .map_err(at(PipelineStep::Save))?,
                )
            }
            None => None,
        };

        info!(
            findings = report.as_ref().map(|r| r.findings.len()),
            version = version.as_ref().map(|v| v.version),
            "Pipeline complete"
        );

        Ok(PipelineOutput {
            repository,
            summary,
            document,
            report,
            version,
        })
    }

    /// Run independent pipelines concurrently, one result per id in input order
    pub async fn run_many(
        &self,
        ids: &[RepositoryId],
        cancel: &CancelToken,
    ) -> Vec<Result<PipelineOutput>> {
        join_all(ids.iter().map(|id| self.run(id, cancel))).await
    }

    async fn analyze(&self, repository: Repository) -> Result<CodeSummary> {
        let analyzer = self.analyzer.clone();
        tokio::task::spawn_blocking(move || analyzer.analyze(&repository))
            .await
            .map_err(|e| DocForgeError::Io(std::io::Error::other(e.to_string())))?
    }
}

/// Append on the blocking pool; SQLite calls block
pub async fn save(store: Arc<dyn VersionStore>, version: NewVersion) -> Result<VersionRecord> {
    tokio::task::spawn_blocking(move || store.append(&version))
        .await
        .map_err(|e| DocForgeError::Io(std::io::Error::other(e.to_string())))?
}
