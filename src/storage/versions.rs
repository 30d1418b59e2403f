//! Append-only document version history.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use super::database::Database;
use crate::types::{
    DocForgeError, NewVersion, RepositoryId, Result, ResultExt, VersionRecord, sha256_hex,
};

/// Saved document versions, numbered 1..n per repository.
///
/// Versions are never updated or deleted.
pub trait VersionStore: Send + Sync {
    /// Store a new immutable version and return it with its assigned number
    fn append(&self, version: &NewVersion) -> Result<VersionRecord>;

    /// All versions of a repository, oldest first
    fn list(&self, repository: &RepositoryId) -> Result<Vec<VersionRecord>>;

    fn get(&self, repository: &RepositoryId, version: u32) -> Result<Option<VersionRecord>>;

    fn latest(&self, repository: &RepositoryId) -> Result<Option<VersionRecord>>;
}

const SELECT_COLUMNS: &str = "SELECT id, repository_id, version, content, content_hash, \
     fingerprint, generated_at, saved_at, note FROM document_versions";

impl VersionStore for Database {
    fn append(&self, new: &NewVersion) -> Result<VersionRecord> {
        let record = self.transaction(|conn| {
            let next: u32 = conn
                .query_row(
                    "SELECT COALESCE(MAX(version), 0) + 1 FROM document_versions
                     WHERE repository_id = ?1",
                    params![new.repository.as_str()],
                    |row| row.get(0),
                )
                .with_context("Failed to compute next version number")?;

            let record = VersionRecord {
                id: uuid::Uuid::new_v4().to_string(),
                repository: new.repository.clone(),
                version: next,
                content: new.content.clone(),
                content_hash: sha256_hex(&new.content),
                fingerprint: new.fingerprint.clone(),
                generated_at: new.generated_at,
                saved_at: Utc::now(),
                note: new.note.clone(),
            };

            conn.execute(
                "INSERT INTO document_versions
                 (id, repository_id, version, content, content_hash, fingerprint,
                  generated_at, saved_at, note)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id,
                    record.repository.as_str(),
                    record.version,
                    record.content,
                    record.content_hash,
                    record.fingerprint,
                    record.generated_at.to_rfc3339(),
                    record.saved_at.to_rfc3339(),
                    record.note,
                ],
            )
            .with_context("Failed to insert document version")?;

            Ok(record)
        })?;

        tracing::info!(
            repository = %record.repository,
            version = record.version,
            "Saved document version"
        );
        Ok(record)
    }

    fn list(&self, repository: &RepositoryId) -> Result<Vec<VersionRecord>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(&format!(
                "{SELECT_COLUMNS} WHERE repository_id = ?1 ORDER BY version ASC"
            ))
            .with_context("Failed to prepare version history query")?;

        let rows = stmt
            .query_map(params![repository.as_str()], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context("Failed to fetch version history")?;

        rows.into_iter().map(VersionRow::into_record).collect()
    }

    fn get(&self, repository: &RepositoryId, version: u32) -> Result<Option<VersionRecord>> {
        let conn = self.connection()?;
        conn.query_row(
            &format!("{SELECT_COLUMNS} WHERE repository_id = ?1 AND version = ?2"),
            params![repository.as_str(), version],
            map_row,
        )
        .optional()
        .with_context("Failed to load document version")?
        .map(VersionRow::into_record)
        .transpose()
    }

    fn latest(&self, repository: &RepositoryId) -> Result<Option<VersionRecord>> {
        let conn = self.connection()?;
        conn.query_row(
            &format!("{SELECT_COLUMNS} WHERE repository_id = ?1 ORDER BY version DESC LIMIT 1"),
            params![repository.as_str()],
            map_row,
        )
        .optional()
        .with_context("Failed to load latest document version")?
        .map(VersionRow::into_record)
        .transpose()
    }
}

/// Raw column values; validated into a `VersionRecord` outside the row callback
struct VersionRow {
    id: String,
    repository_id: String,
    version: u32,
    content: String,
    content_hash: String,
    fingerprint: String,
    generated_at: String,
    saved_at: String,
    note: Option<String>,
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<VersionRow> {
    Ok(VersionRow {
        id: row.get(0)?,
        repository_id: row.get(1)?,
        version: row.get(2)?,
        content: row.get(3)?,
        content_hash: row.get(4)?,
        fingerprint: row.get(5)?,
        generated_at: row.get(6)?,
        saved_at: row.get(7)?,
        note: row.get(8)?,
    })
}

impl VersionRow {
    fn into_record(self) -> Result<VersionRecord> {
        Ok(VersionRecord {
            repository: RepositoryId::new(self.repository_id)?,
            generated_at: parse_timestamp(&self.generated_at, &self.id)?,
            saved_at: parse_timestamp(&self.saved_at, &self.id)?,
            id: self.id,
            version: self.version,
            content: self.content,
            content_hash: self.content_hash,
            fingerprint: self.fingerprint,
            note: self.note,
        })
    }
}

fn parse_timestamp(value: &str, id: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            DocForgeError::Storage(format!("Corrupted timestamp '{}' in version {}: {}", value, id, e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DraftDocument;

    fn store() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    fn draft(repo: &str, text: &str) -> NewVersion {
        let doc = DraftDocument::new(RepositoryId::new(repo).unwrap(), text, Utc::now(), "fp-1");
        NewVersion::from_document(&doc)
    }

    #[test]
    fn test_versions_are_sequential_per_repository() {
        let db = store();
        let alpha = RepositoryId::new("user/project-alpha").unwrap();
        let beta = RepositoryId::new("user/project-beta").unwrap();

        for i in 0..3 {
            db.append(&draft("user/project-alpha", &format!("# Alpha v{i}\n")))
                .unwrap();
        }
        let beta_first = db.append(&draft("user/project-beta", "# Beta\n")).unwrap();

        let versions: Vec<u32> = db.list(&alpha).unwrap().iter().map(|v| v.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
        assert_eq!(beta_first.version, 1);
        assert_eq!(db.list(&beta).unwrap().len(), 1);
    }

    #[test]
    fn test_append_records_hash_fingerprint_and_note() {
        let db = store();
        let record = db
            .append(&draft("user/api-service", "# API\n").with_note("first cut"))
            .unwrap();

        assert_eq!(record.content_hash, sha256_hex("# API\n"));
        assert_eq!(record.fingerprint, "fp-1");
        assert_eq!(record.note.as_deref(), Some("first cut"));

        let loaded = db.get(&record.repository, 1).unwrap().unwrap();
        assert_eq!(loaded.id, record.id);
        assert_eq!(loaded.content, "# API\n");
        assert_eq!(loaded.generated_at.timestamp(), record.generated_at.timestamp());
    }

    #[test]
    fn test_identical_content_still_creates_new_version() {
        let db = store();
        db.append(&draft("user/api-service", "# Same\n")).unwrap();
        let second = db.append(&draft("user/api-service", "# Same\n")).unwrap();

        assert_eq!(second.version, 2);
        let latest = db.latest(&second.repository).unwrap().unwrap();
        assert_eq!(latest.version, 2);
    }

    #[test]
    fn test_missing_versions() {
        let db = store();
        let repo = RepositoryId::new("user/nothing").unwrap();
        assert!(db.list(&repo).unwrap().is_empty());
        assert!(db.latest(&repo).unwrap().is_none());
        assert!(db.get(&repo, 1).unwrap().is_none());
    }

    #[test]
    fn test_concurrent_appends_have_no_gaps() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = std::sync::Arc::new(Database::open(dir.path().join("v.db")).unwrap());
        db.initialize().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let db = db.clone();
                std::thread::spawn(move || {
                    db.append(&draft("user/busy", &format!("# Busy {i}\n"))).unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let repo = RepositoryId::new("user/busy").unwrap();
        let versions: Vec<u32> = db.list(&repo).unwrap().iter().map(|v| v.version).collect();
        assert_eq!(versions, (1..=8).collect::<Vec<_>>());
    }
}
