//! Repository Source
//!
//! Lists, searches and fetches candidate repositories. Version-control
//! operations stay outside: sources only read checkouts already on disk.

mod local;

pub use local::LocalRepositorySource;

use crate::types::{Repository, RepositoryId, Result};

/// Source of candidate repositories
pub trait RepositorySource: Send + Sync {
    /// All known repositories, sorted by id
    fn list(&self) -> Result<Vec<Repository>>;

    /// Repositories whose id contains `query`, case-insensitive.
    /// An empty query matches everything.
    fn search(&self, query: &str) -> Result<Vec<Repository>> {
        let needle = query.trim().to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|r| r.id.as_str().to_lowercase().contains(&needle))
            .collect())
    }

    /// Fresh snapshot of one repository
    fn fetch(&self, id: &RepositoryId) -> Result<Repository>;
}
