//! DocForge - AI-Assisted Repository Documentation
//!
//! Analyzes a code repository, drafts Markdown documentation through a
//! language model backend, lints the draft and keeps an append-only version
//! history of saved drafts.
//!
//! ## Quick Start
//!
//! ```ignore
//! use docforge::{CodeAnalyzer, DocGenerator, Pipeline, RepositoryId};
//!
//! let pipeline = Pipeline::new(source, CodeAnalyzer::new(config.analysis), generator)
//!     .with_linter(linter)
//!     .with_store(store);
//! let output = pipeline.run(&RepositoryId::new("user/api-service")?, &cancel).await?;
//! ```
//!
//! ## Modules
//!
//! - [`repository`]: Listing and fetching local repository checkouts
//! - [`analyzer`]: File scanning and symbol extraction into a `CodeSummary`
//! - [`ai`]: Model backends with retry, timeout and cancellation
//! - [`generator`]: Draft generation from a summary
//! - [`linter`]: Structural and semantic documentation linting
//! - [`session`]: Editable drafts with content-bound lint results
//! - [`storage`]: SQLite version history
//! - [`pipeline`]: fetch → analyze → generate → lint → save

pub mod ai;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod constants;
pub mod generator;
pub mod linter;
pub mod pipeline;
pub mod repository;
pub mod session;
pub mod storage;
pub mod types;

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{DocForgeError, PipelineStep, Result, ResultExt};

// Domain Types
pub use types::{
    CodeSummary, DraftDocument, LintFinding, LintReport, NewVersion, Repository, RepositoryId,
    Severity, SourceUnit, VersionRecord,
};

// Storage
pub use storage::database::PoolConfig;
pub use storage::{Database, SharedDatabase, VersionStore};

// Components
pub use ai::{CancelToken, ModelBackend, RetryPolicy, SharedBackend, create_backend};
pub use analyzer::CodeAnalyzer;
pub use generator::DocGenerator;
pub use linter::{Linter, Reporter};
pub use pipeline::{Pipeline, PipelineOutput};
pub use repository::{LocalRepositorySource, RepositorySource};
pub use session::{DocumentSession, LintOutcome, SessionRegistry};
