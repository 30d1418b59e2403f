pub mod document;
pub mod error;
pub mod finding;
pub mod repository;
pub mod summary;
pub mod utils;
pub mod version;

pub use document::{DraftDocument, DraftMetadata};
pub use error::{DocForgeError, ErrorClassifier, PipelineStep, Result, ResultExt};
pub use finding::{Anchor, FindingOrigin, LintFinding, LintReport, Severity};
pub use repository::{Repository, RepositoryId};
pub use summary::{CodeSummary, SourceUnit, is_endpoint};
pub use utils::{log_filter_error, sha256_hex, short_hash};
pub use version::{NewVersion, VersionRecord};
