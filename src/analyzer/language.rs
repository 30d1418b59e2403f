//! Language detection by file extension.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Rust,
    Python,
    Go,
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "ts" | "tsx" | "mts" | "cts" => Self::TypeScript,
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "rs" => Self::Rust,
            "py" => Self::Python,
            "go" => Self::Go,
            _ => Self::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// File stems conventionally used for program entry points
    pub fn entry_file_names(&self) -> &'static [&'static str] {
        match self {
            Self::TypeScript | Self::JavaScript => &["index", "main", "server", "app"],
            Self::Rust => &["main", "lib"],
            Self::Python => &["__main__", "main", "app", "manage", "wsgi"],
            Self::Go => &["main"],
            Self::Unknown => &[],
        }
    }

    pub fn is_ecmascript(&self) -> bool {
        matches!(self, Self::TypeScript | Self::JavaScript)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TypeScript => "TypeScript",
            Self::JavaScript => "JavaScript",
            Self::Rust => "Rust",
            Self::Python => "Python",
            Self::Go => "Go",
            Self::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}
