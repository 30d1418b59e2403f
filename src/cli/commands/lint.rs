//! Lint Command
//!
//! Lint a draft document file. The file is watched while the lint runs; a
//! report is only shown for the exact content it was computed from.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::ai::CancelToken;
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, cancel_on_ctrl_c, read_document, read_draft_metadata};
use crate::linter::{Linter, Reporter};
use crate::session::{DocumentSession, LintOutcome};
use crate::types::{DocForgeError, DraftDocument, RepositoryId, Result, sha256_hex};

const WATCH_INTERVAL: Duration = Duration::from_millis(200);

pub async fn run(
    file: &Path,
    structural_only: bool,
    format: &str,
    report_path: Option<&Path>,
) -> Result<()> {
    let context = CommandContext::load()?;
    let linter = context.linter(structural_only)?;
    let session = DocumentSession::new(open_draft(file)?);

    let report = match lint_watching(&session, &linter, file, &cancel_on_ctrl_c()).await? {
        LintOutcome::Attached(report) => report,
        LintOutcome::Discarded => {
            Output::warning("Document changed during lint; result discarded. Run lint again.");
            return Ok(());
        }
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        Reporter::print_summary(&report);
    }

    if let Some(path) = report_path {
        Reporter::write_json(&report, path)?;
        if format != "json" {
            println!("\nReport saved to: {}", path.display());
        }
    }

    if report.has_errors() {
        return Err(DocForgeError::LintFailed {
            errors: report.error_count(),
            warnings: report.warning_count(),
        });
    }
    Ok(())
}

/// Draft for `file`, with provenance from its sidecar when there is one
fn open_draft(file: &Path) -> Result<DraftDocument> {
    let text = read_document(file)?;
    let draft = match read_draft_metadata(file)? {
        Some(metadata) => DraftDocument::new(
            metadata.repository,
            text,
            metadata.generated_at,
            metadata.fingerprint,
        ),
        None => DraftDocument::new(local_id(file)?, text, Utc::now(), ""),
    };
    Ok(draft)
}

/// `local/<file name>` for documents with no known repository
fn local_id(file: &Path) -> Result<RepositoryId> {
    let name: String = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "document".to_string())
        .chars()
        .map(|c| if c.is_whitespace() || c == '/' { '-' } else { c })
        .collect();
    RepositoryId::new(format!("local/{}", name))
}

/// Lint the session while applying on-disk edits to it.
///
/// Edits seen before the pass finishes make it `Discarded`; a final re-read
/// after the pass catches edits that landed after the report was attached.
pub async fn lint_watching(
    session: &DocumentSession,
    linter: &Linter,
    file: &Path,
    cancel: &CancelToken,
) -> Result<LintOutcome> {
    let lint = session.lint(linter, cancel);
    tokio::pin!(lint);
    let mut interval = tokio::time::interval(WATCH_INTERVAL);

    let outcome = loop {
        tokio::select! {
            outcome = &mut lint => break outcome?,
            _ = interval.tick() => sync_from_file(session, file).await,
        }
    };

    sync_from_file(session, file).await;
    match outcome {
        LintOutcome::Attached(_) => Ok(session
            .report()
            .await
            .map_or(LintOutcome::Discarded, LintOutcome::Attached)),
        LintOutcome::Discarded => Ok(LintOutcome::Discarded),
    }
}

async fn sync_from_file(session: &DocumentSession, file: &Path) {
    let text = match tokio::fs::read_to_string(file).await {
        Ok(text) => text,
        Err(e) => {
            warn!(file = %file.display(), "Cannot re-read document: {}", e);
            return;
        }
    };
    if sha256_hex(&text) != session.content_hash().await {
        debug!(file = %file.display(), "Document changed on disk");
        session.edit(text).await;
    }
}
