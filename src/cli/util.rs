//! CLI Common Utilities
//!
//! Shared context for command handlers: configuration, backend, repository
//! source and version database.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ai::{CancelToken, RetryPolicy, SharedBackend, create_backend};
use crate::analyzer::CodeAnalyzer;
use crate::config::{Config, ConfigLoader};
use crate::generator::DocGenerator;
use crate::linter::{Linter, RuleSet};
use crate::repository::{LocalRepositorySource, RepositorySource};
use crate::storage::{Database, SharedDatabase};
use crate::types::{DocForgeError, DraftDocument, DraftMetadata, RepositoryId, Result};

/// Command execution context
///
/// Holds the merged configuration and the project root it was loaded for.
/// Expensive resources (backend client, database) are built on demand.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub root: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// Load configuration for the current directory. Works before `init`.
    pub fn load() -> Result<Self> {
        let root = std::env::current_dir()?;
        let config = ConfigLoader::load_in(&root)?;
        Ok(Self { root, config })
    }

    /// Load configuration and require `docforge init` to have run
    pub fn load_initialized() -> Result<Self> {
        let context = Self::load()?;
        if !ConfigLoader::is_project_initialized_in(&context.root) {
            return Err(DocForgeError::NotInitialized);
        }
        Ok(context)
    }

    pub fn backend(&self) -> Result<SharedBackend> {
        create_backend(&self.config.backend)
    }

    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy::from(&self.config.retry)
    }

    pub fn source(&self) -> Result<Arc<dyn RepositorySource>> {
        let source = LocalRepositorySource::new(&self.config.repositories, &self.root)?;
        Ok(Arc::new(source))
    }

    pub fn analyzer(&self) -> CodeAnalyzer {
        CodeAnalyzer::new(self.config.analysis.clone())
    }

    pub fn generator(&self, backend: SharedBackend) -> DocGenerator {
        let rules = RuleSet::new(&self.config.lint);
        DocGenerator::new(backend, self.retry(), self.config.generation.clone())
            .with_required_sections(rules.required_sections())
    }

    /// Linter honoring `lint.semantic`; `structural_only` forces it off
    pub fn linter(&self, structural_only: bool) -> Result<Linter> {
        if structural_only || !self.config.lint.semantic {
            return Ok(Linter::structural_only(&self.config.lint));
        }
        Ok(Linter::with_backend(
            &self.config.lint,
            self.backend()?,
            self.retry(),
        ))
    }

    pub fn database_path(&self) -> PathBuf {
        ConfigLoader::database_path_in(&self.root)
    }

    /// Open the version database, creating the schema when needed
    pub fn database(&self) -> Result<SharedDatabase> {
        if !ConfigLoader::is_project_initialized_in(&self.root) {
            return Err(DocForgeError::NotInitialized);
        }
        let db = Database::open(self.database_path())?;
        db.initialize()?;
        Ok(Arc::new(db))
    }
}

pub fn parse_repository_id(raw: &str) -> Result<RepositoryId> {
    RepositoryId::new(raw.trim())
}

pub fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        DocForgeError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}

/// Write the draft text and its provenance sidecar
pub fn write_draft(path: &Path, document: &DraftDocument) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, document.text())?;
    let metadata = DraftMetadata::from_document(document);
    fs::write(
        DraftMetadata::sidecar_path(path),
        serde_json::to_string_pretty(&metadata)?,
    )?;
    Ok(())
}

/// Provenance written by `write_draft`, if the sidecar exists
pub fn read_draft_metadata(path: &Path) -> Result<Option<DraftMetadata>> {
    let sidecar = DraftMetadata::sidecar_path(path);
    if !sidecar.exists() {
        return Ok(None);
    }
    let raw = read_document(&sidecar)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Cancel token tripped by Ctrl-C. Must be called inside a Tokio runtime.
pub fn cancel_on_ctrl_c() -> CancelToken {
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; cancelling in-flight requests");
            trigger.cancel();
        }
    });
    cancel
}

/// `user/api-service` → `user-api-service.md`
pub fn document_file_name(id: &RepositoryId) -> String {
    format!("{}-{}.md", id.owner(), id.name())
}
