//! Save Command
//!
//! Store an edited draft as the next version of a repository's document.
//! The fingerprint and generation time come from the sidecar `generate`
//! wrote next to the draft.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, parse_repository_id, read_document, read_draft_metadata};
use crate::pipeline;
use crate::storage::VersionStore;
use crate::types::{
    DocForgeError, DraftDocument, NewVersion, RepositoryId, Result, sha256_hex, short_hash,
};

pub async fn run(repository: &str, file: &Path, note: Option<String>) -> Result<()> {
    let context = CommandContext::load_initialized()?;
    let id = parse_repository_id(repository)?;
    let text = read_document(file)?;
    let store: std::sync::Arc<dyn VersionStore> = context.database()?;

    let (fingerprint, generated_at) = provenance(file, &id, &text, || {
        let repository = context.source()?.fetch(&id)?;
        Ok(context.analyzer().analyze(&repository)?.fingerprint())
    })?;

    let document = DraftDocument::new(id, text, generated_at, fingerprint);
    let mut version = NewVersion::from_document(&document);
    if let Some(note) = note {
        version = version.with_note(note);
    }

    let record = pipeline::save(store, version).await?;
    Output::success(&format!(
        "Saved {} version {} ({})",
        record.repository,
        record.version,
        short_hash(&record.content_hash)
    ));
    Ok(())
}

/// Fingerprint and generation time for the draft at `file`.
///
/// Uses the draft's sidecar metadata. Without one, `reanalyze` supplies the
/// fingerprint of the current checkout and the generation time is now.
fn provenance(
    file: &Path,
    id: &RepositoryId,
    text: &str,
    reanalyze: impl FnOnce() -> Result<String>,
) -> Result<(String, DateTime<Utc>)> {
    match read_draft_metadata(file)? {
        Some(metadata) => {
            if &metadata.repository != id {
                return Err(DocForgeError::Config(format!(
                    "{} was generated for {}, not {}",
                    file.display(),
                    metadata.repository,
                    id
                )));
            }
            if metadata.content_hash != sha256_hex(text) {
                debug!(file = %file.display(), "Draft edited since generation");
            }
            Ok((metadata.fingerprint, metadata.generated_at))
        }
        None => {
            warn!(
                file = %file.display(),
                "No draft metadata found; recording the fingerprint of the current checkout"
            );
            Ok((reanalyze()?, Utc::now()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::util::write_draft;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn id() -> RepositoryId {
        RepositoryId::new("user/api-service").unwrap()
    }

    #[test]
    fn test_provenance_from_sidecar_ignores_current_checkout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user-api-service.md");
        let generated_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let document = DraftDocument::new(id(), "# Api\n", generated_at, "fp-generated");
        write_draft(&path, &document).unwrap();

        let (fingerprint, at) = provenance(&path, &id(), "# Api\n\nEdited.\n", || {
            panic!("checkout must not be re-analyzed")
        })
        .unwrap();

        assert_eq!(fingerprint, "fp-generated");
        assert_eq!(at, generated_at);
    }

    #[test]
    fn test_provenance_without_sidecar_reanalyzes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hand-written.md");
        std::fs::write(&path, "# Api\n").unwrap();

        let (fingerprint, _) =
            provenance(&path, &id(), "# Api\n", || Ok("fp-current".to_string())).unwrap();
        assert_eq!(fingerprint, "fp-current");
    }

    #[test]
    fn test_provenance_rejects_other_repository() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("draft.md");
        let other = RepositoryId::new("user/web-app").unwrap();
        write_draft(&path, &DraftDocument::new(other, "# Web\n", Utc::now(), "fp")).unwrap();

        let err = provenance(&path, &id(), "# Web\n", || Ok("fp".to_string())).unwrap_err();
        assert!(err.to_string().contains("user/web-app"));
    }
}
