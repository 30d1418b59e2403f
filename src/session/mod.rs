//! Document sessions: one editable draft per repository.
//!
//! Lint results are only ever attached to the exact content they were
//! computed from. A lint pass snapshots the content hash when it starts; if
//! the draft was edited before the pass finishes the result is dropped.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::ai::CancelToken;
use crate::linter::Linter;
use crate::types::{DocForgeError, DraftDocument, LintReport, RepositoryId, Result, short_hash};

/// What happened to a finished lint pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintOutcome {
    /// The report matches the current content and is now attached
    Attached(LintReport),
    /// The content changed while linting; the report was thrown away
    Discarded,
}

#[derive(Debug)]
struct SessionState {
    document: DraftDocument,
    report: Option<LintReport>,
}

/// A draft plus the lint report valid for its current content
#[derive(Debug)]
pub struct DocumentSession {
    state: RwLock<SessionState>,
}

impl DocumentSession {
    pub fn new(document: DraftDocument) -> Self {
        Self {
            state: RwLock::new(SessionState {
                document,
                report: None,
            }),
        }
    }

    pub async fn document(&self) -> DraftDocument {
        self.state.read().await.document.clone()
    }

    pub async fn content_hash(&self) -> String {
        self.state.read().await.document.content_hash()
    }

    /// Report for the current content, if a lint pass finished since the last edit
    pub async fn report(&self) -> Option<LintReport> {
        self.state.read().await.report.clone()
    }

    /// Replace the text. Any attached report is dropped.
    pub async fn edit(&self, text: impl Into<String>) {
        let mut state = self.state.write().await;
        state.document.edit(text);
        state.report = None;
    }

    /// Swap in a freshly generated draft
    pub async fn replace(&self, document: DraftDocument) {
        let mut state = self.state.write().await;
        state.document = document;
        state.report = None;
    }

    /// Lint a snapshot of the current text and attach the result if the
    /// content is unchanged when the pass finishes.
    pub async fn lint(&self, linter: &Linter, cancel: &CancelToken) -> Result<LintOutcome> {
        let text = self.state.read().await.document.text().to_string();
        let report = linter.lint(&text, cancel).await?;

        match self.attach(report).await {
            Ok(report) => Ok(LintOutcome::Attached(report)),
            Err(DocForgeError::StaleFindings { expected, actual }) => {
                debug!(
                    linted = short_hash(&expected),
                    current = short_hash(&actual),
                    "Discarding stale lint result"
                );
                Ok(LintOutcome::Discarded)
            }
            Err(e) => Err(e),
        }
    }

    /// Attach `report` when it was computed from the current content
    async fn attach(&self, report: LintReport) -> Result<LintReport> {
        let mut state = self.state.write().await;
        let current = state.document.content_hash();
        if report.content_hash != current {
            return Err(DocForgeError::StaleFindings {
                expected: report.content_hash,
                actual: current,
            });
        }
        state.report = Some(report.clone());
        Ok(report)
    }
}

/// One session per repository, shared across tasks
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<RepositoryId, Arc<DocumentSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for the draft's repository, replacing the draft of an
    /// existing session
    pub async fn open(&self, document: DraftDocument) -> Arc<DocumentSession> {
        let session = self
            .sessions
            .entry(document.repository().clone())
            .or_insert_with(|| Arc::new(DocumentSession::new(document.clone())))
            .clone();
        session.replace(document).await;
        session
    }

    pub fn get(&self, repository: &RepositoryId) -> Option<Arc<DocumentSession>> {
        self.sessions.get(repository).map(|s| s.clone())
    }

    pub fn close(&self, repository: &RepositoryId) -> Option<Arc<DocumentSession>> {
        self.sessions.remove(repository).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::RetryPolicy;
    use crate::ai::backend::scripted::{ScriptedBackend, Step};
    use crate::config::LintConfig;
    use chrono::Utc;
    use std::time::Duration;
    use tokio::sync::Notify;

    const EMPTY_FINDINGS: &str = r#"{"findings": []}"#;

    fn draft(text: &str) -> DraftDocument {
        DraftDocument::new(
            RepositoryId::new("user/project-alpha").unwrap(),
            text,
            Utc::now(),
            "fp",
        )
    }

    fn linter(backend: Arc<ScriptedBackend>) -> Linter {
        Linter::with_backend(
            &LintConfig::default(),
            backend,
            RetryPolicy::fixed(1, Duration::from_millis(1), Duration::from_millis(1)),
        )
    }

    #[tokio::test]
    async fn test_lint_attaches_report_for_unchanged_content() {
        let session = DocumentSession::new(draft("# Title\n"));
        let linter = Linter::structural_only(&LintConfig::default());

        let outcome = session.lint(&linter, &CancelToken::new()).await.unwrap();
        let LintOutcome::Attached(report) = outcome else {
            panic!("expected attached report");
        };
        assert_eq!(report.content_hash, session.content_hash().await);
        assert_eq!(session.report().await, Some(report));
    }

    #[tokio::test]
    async fn test_edit_invalidates_report() {
        let session = DocumentSession::new(draft("# Title\n"));
        let linter = Linter::structural_only(&LintConfig::default());
        session.lint(&linter, &CancelToken::new()).await.unwrap();

        session.edit("# Title\n\n## Overview\n").await;
        assert!(session.report().await.is_none());
    }

    #[tokio::test]
    async fn test_edit_during_lint_discards_result() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(ScriptedBackend::new(vec![Step::Gated(
            gate.clone(),
            EMPTY_FINDINGS.to_string(),
        )]));
        let linter = linter(backend.clone());
        let session = Arc::new(DocumentSession::new(draft("# Title\n\nSome text.\n")));

        let lint_task = {
            let session = session.clone();
            tokio::spawn(async move { session.lint(&linter, &CancelToken::new()).await })
        };

        while backend.calls() == 0 {
            tokio::task::yield_now().await;
        }
        session.edit("# Title\n\nEdited text.\n").await;
        gate.notify_one();

        let outcome = lint_task.await.unwrap().unwrap();
        assert_eq!(outcome, LintOutcome::Discarded);
        assert!(session.report().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_lint_keeps_previous_state() {
        let backend = Arc::new(ScriptedBackend::new(vec![Step::Reply("not json".into())]));
        let session = DocumentSession::new(draft("# Title\n\nBody.\n"));

        let err = session
            .lint(&linter(backend), &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DocForgeError::MalformedResponse { .. }));
        assert!(session.report().await.is_none());
    }

    #[tokio::test]
    async fn test_registry_one_session_per_repository() {
        let registry = SessionRegistry::new();
        let first = registry.open(draft("# One\n")).await;
        let second = registry.open(draft("# Two\n")).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert_eq!(first.document().await.text(), "# Two\n");

        let id = RepositoryId::new("user/project-alpha").unwrap();
        assert!(registry.get(&id).is_some());
        assert!(registry.close(&id).is_some());
        assert!(registry.is_empty());
    }
}
