use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::error::{DocForgeError, Result};

/// Type-safe `owner/name` repository identifier
///
/// Prevents accidental mixing of repository ids with other string types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryId(String);

impl RepositoryId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let invalid = |reason: &str| DocForgeError::InvalidRepositoryId {
            id: id.clone(),
            reason: reason.to_string(),
        };

        if id.chars().any(char::is_whitespace) {
            return Err(invalid("must not contain whitespace"));
        }
        let Some((owner, name)) = id.split_once('/') else {
            return Err(invalid("expected owner/name"));
        };
        if owner.is_empty() || name.is_empty() {
            return Err(invalid("owner and name must be non-empty"));
        }
        if name.contains('/') {
            return Err(invalid("expected exactly one '/'"));
        }

        Ok(Self(id))
    }

    pub fn owner(&self) -> &str {
        self.0.split_once('/').map(|(o, _)| o).unwrap_or(&self.0)
    }

    pub fn name(&self) -> &str {
        self.0.split_once('/').map(|(_, n)| n).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RepositoryId {
    type Err = DocForgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for RepositoryId {
    type Error = DocForgeError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<RepositoryId> for String {
    fn from(id: RepositoryId) -> Self {
        id.0
    }
}

impl AsRef<str> for RepositoryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A candidate repository as reported by a repository source.
///
/// Values are immutable; re-syncing produces a fresh value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,
    /// Local checkout location
    pub location: PathBuf,
    pub default_branch: String,
}

impl Repository {
    pub fn new(id: RepositoryId, location: impl Into<PathBuf>, default_branch: impl Into<String>) -> Self {
        Self {
            id,
            location: location.into(),
            default_branch: default_branch.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_id_parts() {
        let id = RepositoryId::new("user/api-service").unwrap();
        assert_eq!(id.owner(), "user");
        assert_eq!(id.name(), "api-service");
        assert_eq!(id.to_string(), "user/api-service");
    }

    #[test]
    fn test_repository_id_rejects_invalid() {
        for bad in ["", "api-service", "/name", "owner/", "a/b/c", "a b/c"] {
            assert!(RepositoryId::new(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_repository_id_serde_validates() {
        let id: RepositoryId = serde_json::from_str("\"user/project-alpha\"").unwrap();
        assert_eq!(id.name(), "project-alpha");
        assert!(serde_json::from_str::<RepositoryId>("\"nope\"").is_err());
    }
}
