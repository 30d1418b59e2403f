//! Code Analyzer Module
//!
//! Turns a repository checkout into a `CodeSummary`:
//! - File scanning with gitignore support and exclude globs
//! - tree-sitter extraction of exports, endpoints and entry points

pub mod language;
pub mod scanner;
pub mod symbols;

pub use language::Language;
pub use scanner::{FileScanner, ScannedFile};
pub use symbols::{Extraction, SymbolExtractor};

use std::fs;
use tracing::{debug, info, instrument, warn};

use crate::config::AnalysisConfig;
use crate::types::{CodeSummary, Repository, Result, SourceUnit};

/// Produces a fresh `CodeSummary` per analysis run
#[derive(Debug, Clone)]
pub struct CodeAnalyzer {
    config: AnalysisConfig,
    extractor: SymbolExtractor,
}

impl CodeAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            extractor: SymbolExtractor::default(),
        }
    }

    /// Scan the repository checkout and extract one unit per source file.
    ///
    /// Units come back sorted by path. Files that are not valid UTF-8 are
    /// skipped. A missing checkout directory is an I/O error.
    #[instrument(skip(self, repository), fields(repository = %repository.id))]
    pub fn analyze(&self, repository: &Repository) -> Result<CodeSummary> {
        let root = &repository.location;
        if !root.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("repository checkout not found: {}", root.display()),
            )
            .into());
        }

        let files = FileScanner::new(root)
            .with_exclude(&self.config.exclude)
            .with_max_file_size(self.config.max_file_size)
            .scan()?;

        let mut units = Vec::with_capacity(files.len().min(self.config.max_units));
        for file in &files {
            if units.len() >= self.config.max_units {
                warn!(
                    max_units = self.config.max_units,
                    total = files.len(),
                    "Unit limit reached, remaining files skipped"
                );
                break;
            }

            let content = match fs::read_to_string(&file.path) {
                Ok(content) => content,
                Err(e) => {
                    debug!(path = %file.relative, error = %e, "Skipping unreadable file");
                    continue;
                }
            };

            let Extraction {
                symbols,
                entry_point,
            } = self
                .extractor
                .extract(&file.relative, file.language, &content)?;
            units.push(SourceUnit::new(file.relative.clone(), symbols).with_entry_point(entry_point));
        }

        let summary = CodeSummary::new(units);
        info!(
            units = summary.len(),
            symbols = summary.symbol_count(),
            endpoints = summary.has_endpoints(),
            "Analysis complete"
        );
        Ok(summary)
    }
}
