use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::DraftDocument;
use super::repository::RepositoryId;

/// Immutable snapshot of a draft at save time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub id: String,
    pub repository: RepositoryId,
    /// Sequential per repository, starting at 1
    pub version: u32,
    pub content: String,
    pub content_hash: String,
    pub fingerprint: String,
    pub generated_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
    pub note: Option<String>,
}

/// Input for appending a new version; the store assigns id, number and time
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub repository: RepositoryId,
    pub content: String,
    pub fingerprint: String,
    pub generated_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl NewVersion {
    pub fn from_document(document: &DraftDocument) -> Self {
        Self {
            repository: document.repository().clone(),
            content: document.text().to_string(),
            fingerprint: document.fingerprint().to_string(),
            generated_at: document.generated_at(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
