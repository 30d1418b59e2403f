use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::repository::RepositoryId;
use super::utils::sha256_hex;

/// Generated documentation draft.
///
/// The fingerprint records which code summary produced the draft. Edits
/// replace the text but never touch the fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftDocument {
    repository: RepositoryId,
    text: String,
    generated_at: DateTime<Utc>,
    fingerprint: String,
}

impl DraftDocument {
    pub fn new(
        repository: RepositoryId,
        text: impl Into<String>,
        generated_at: DateTime<Utc>,
        fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            text: text.into(),
            generated_at,
            fingerprint: fingerprint.into(),
        }
    }

    pub fn repository(&self) -> &RepositoryId {
        &self.repository
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// SHA-256 of the current text
    pub fn content_hash(&self) -> String {
        sha256_hex(&self.text)
    }

    /// Replace the text with a user edit
    pub fn edit(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

/// Provenance of a draft written to disk, stored next to it so a later save
/// records the summary the draft was generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftMetadata {
    pub repository: RepositoryId,
    pub fingerprint: String,
    pub generated_at: DateTime<Utc>,
    /// Hash of the text as generated, before any edit
    pub content_hash: String,
}

impl DraftMetadata {
    pub fn from_document(document: &DraftDocument) -> Self {
        Self {
            repository: document.repository.clone(),
            fingerprint: document.fingerprint.clone(),
            generated_at: document.generated_at,
            content_hash: document.content_hash(),
        }
    }

    /// `docs/api.md` → `docs/api.md.draft.json`
    pub fn sidecar_path(document_path: &Path) -> PathBuf {
        let mut name = document_path.as_os_str().to_os_string();
        name.push(".draft.json");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_keeps_fingerprint_changes_hash() {
        let repo = RepositoryId::new("user/project-alpha").unwrap();
        let mut doc = DraftDocument::new(repo, "# Alpha\n", Utc::now(), "abc123");
        let before = doc.content_hash();

        doc.edit("# Alpha\n\n## Overview\n");

        assert_eq!(doc.fingerprint(), "abc123");
        assert_ne!(doc.content_hash(), before);
        assert_eq!(doc.content_hash(), sha256_hex(doc.text()));
    }

    #[test]
    fn test_metadata_sidecar_path() {
        assert_eq!(
            DraftMetadata::sidecar_path(Path::new("docs/user-api.md")),
            PathBuf::from("docs/user-api.md.draft.json")
        );
    }
}
