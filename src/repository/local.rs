use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::RepositorySource;
use crate::config::RepositoriesConfig;
use crate::types::{DocForgeError, Repository, RepositoryId, Result, log_filter_error};

/// Discovers checkouts under `<root>/<owner>/<name>` plus explicit entries
#[derive(Debug, Clone)]
pub struct LocalRepositorySource {
    root: Option<PathBuf>,
    default_branch: String,
    entries: Vec<(RepositoryId, PathBuf, Option<String>)>,
}

impl LocalRepositorySource {
    /// Relative paths in `config` resolve against `base_dir`
    pub fn new(config: &RepositoriesConfig, base_dir: &Path) -> Result<Self> {
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base_dir.join(p)
            }
        };

        let entries = config
            .entries
            .iter()
            .map(|e| {
                Ok((
                    RepositoryId::new(e.id.clone())?,
                    resolve(&e.path),
                    e.branch.clone(),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            root: config.root.as_deref().map(resolve),
            default_branch: config.default_branch.clone(),
            entries,
        })
    }

    fn discover(&self) -> Result<BTreeMap<RepositoryId, Repository>> {
        let mut found = BTreeMap::new();

        if let Some(root) = &self.root {
            if root.is_dir() {
                for owner in visible_dirs(root)? {
                    for name in visible_dirs(&owner)? {
                        let id = format!("{}/{}", file_name(&owner), file_name(&name));
                        let Some(id) = log_filter_error(RepositoryId::new(id), "Skipping directory")
                        else {
                            continue;
                        };
                        let branch = self.branch_of(&name, None);
                        found.insert(id.clone(), Repository::new(id, name, branch));
                    }
                }
            } else {
                warn!(root = %root.display(), "Repository root does not exist");
            }
        }

        // Explicit entries win over discovered checkouts
        for (id, path, branch) in &self.entries {
            let branch = self.branch_of(path, branch.as_deref());
            found.insert(id.clone(), Repository::new(id.clone(), path.clone(), branch));
        }

        debug!(count = found.len(), "Repositories discovered");
        Ok(found)
    }

    fn branch_of(&self, checkout: &Path, configured: Option<&str>) -> String {
        configured
            .map(str::to_string)
            .or_else(|| read_head_branch(checkout))
            .unwrap_or_else(|| self.default_branch.clone())
    }
}

impl RepositorySource for LocalRepositorySource {
    fn list(&self) -> Result<Vec<Repository>> {
        Ok(self.discover()?.into_values().collect())
    }

    fn fetch(&self, id: &RepositoryId) -> Result<Repository> {
        let repository = self
            .discover()?
            .remove(id)
            .ok_or_else(|| DocForgeError::RepositoryNotFound(id.to_string()))?;

        if !repository.location.is_dir() {
            return Err(DocForgeError::RepositoryNotFound(format!(
                "{} (checkout missing at {})",
                id,
                repository.location.display()
            )));
        }
        Ok(repository)
    }
}

/// Branch named by `.git/HEAD`, if it points at a branch
fn read_head_branch(checkout: &Path) -> Option<String> {
    let head = fs::read_to_string(checkout.join(".git").join("HEAD")).ok()?;
    head.trim()
        .strip_prefix("ref: refs/heads/")
        .filter(|b| !b.is_empty())
        .map(str::to_string)
}

fn visible_dirs(path: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|e| log_filter_error(e, "Skipping unreadable entry"))
        .map(|e| e.path())
        .filter(|p| p.is_dir() && !file_name(p).starts_with('.'))
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepositoryEntry;
    use tempfile::TempDir;

    fn checkout(root: &Path, rel: &str, head: Option<&str>) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(&path).unwrap();
        if let Some(head) = head {
            fs::create_dir_all(path.join(".git")).unwrap();
            fs::write(path.join(".git/HEAD"), head).unwrap();
        }
        path
    }

    fn source(dir: &TempDir, entries: Vec<RepositoryEntry>) -> LocalRepositorySource {
        let config = RepositoriesConfig {
            root: Some(PathBuf::from("checkouts")),
            default_branch: "main".to_string(),
            entries,
        };
        LocalRepositorySource::new(&config, dir.path()).unwrap()
    }

    #[test]
    fn test_list_discovers_owner_name_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("checkouts");
        checkout(&root, "user/project-alpha", Some("ref: refs/heads/develop\n"));
        checkout(&root, "user/api-service", None);
        checkout(&root, "org/.hidden", None);

        let repos = source(&dir, vec![]).list().unwrap();
        let ids: Vec<&str> = repos.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["user/api-service", "user/project-alpha"]);
        assert_eq!(repos[0].default_branch, "main");
        assert_eq!(repos[1].default_branch, "develop");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("checkouts");
        checkout(&root, "user/project-alpha", None);
        checkout(&root, "user/api-service", None);

        let source = source(&dir, vec![]);
        let hits = source.search("API").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_str(), "user/api-service");
        assert_eq!(source.search("").unwrap().len(), 2);
        assert!(source.search("nothing").unwrap().is_empty());
    }

    #[test]
    fn test_explicit_entries_and_fetch() {
        let dir = TempDir::new().unwrap();
        checkout(dir.path(), "elsewhere/web", Some("abc123def\n"));

        let source = source(
            &dir,
            vec![RepositoryEntry {
                id: "acme/web".to_string(),
                path: PathBuf::from("elsewhere/web"),
                branch: None,
            }],
        );

        let id = RepositoryId::new("acme/web").unwrap();
        let repo = source.fetch(&id).unwrap();
        assert_eq!(repo.location, dir.path().join("elsewhere/web"));
        // Detached HEAD falls back to the configured default
        assert_eq!(repo.default_branch, "main");

        let missing = RepositoryId::new("acme/none").unwrap();
        assert!(matches!(
            source.fetch(&missing),
            Err(DocForgeError::RepositoryNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_entry_id_rejected() {
        let config = RepositoriesConfig {
            entries: vec![RepositoryEntry {
                id: "no-slash".to_string(),
                path: PathBuf::from("x"),
                branch: None,
            }],
            ..Default::default()
        };
        assert!(LocalRepositorySource::new(&config, Path::new(".")).is_err());
    }
}
