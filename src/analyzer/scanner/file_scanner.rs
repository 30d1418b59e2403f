use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::analyzer::language::Language;
use crate::constants::analysis;
use crate::types::{Result, log_filter_error};

/// Walks a repository checkout honoring `.gitignore` and exclude globs
pub struct FileScanner {
    root: PathBuf,
    exclude: Vec<glob::Pattern>,
    max_file_size: u64,
}

impl FileScanner {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            exclude: Vec::new(),
            max_file_size: analysis::MAX_FILE_SIZE,
        }
    }

    /// Exclude glob patterns, matched against `/`-separated relative paths.
    /// Invalid patterns are logged and skipped.
    pub fn with_exclude(mut self, patterns: &[String]) -> Self {
        self.exclude = patterns
            .iter()
            .filter_map(|p| log_filter_error(glob::Pattern::new(p), "Invalid exclude pattern"))
            .collect();
        self
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Source files with a recognized language, sorted by relative path
    pub fn scan(&self) -> Result<Vec<ScannedFile>> {
        let mut files = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .follow_links(false) // Security: prevent symlink traversal attacks
            .build();

        for entry in walker.filter_map(|e| log_filter_error(e, "Skipping unreadable entry")) {
            let path = entry.path();

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let Some(relative) = self.relative_path(path) else {
                continue;
            };

            if self.should_exclude(&relative) {
                continue;
            }

            let language = Language::from_path(path);
            if language == Language::Unknown {
                continue;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > self.max_file_size {
                debug!(path = %relative, size, "Skipping oversized file");
                continue;
            }

            files.push(ScannedFile {
                path: path.to_path_buf(),
                relative,
                size,
                language,
            });
        }

        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        Ok(files)
    }

    fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        (!parts.is_empty()).then(|| parts.join("/"))
    }

    fn should_exclude(&self, relative: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(relative))
    }
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// `/`-separated path relative to the scan root
    pub relative: String,
    pub size: u64,
    pub language: Language,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/b.ts", "export const b = 1;");
        write(dir.path(), "src/a.rs", "pub fn a() {}");
        write(dir.path(), "README.md", "# readme");
        write(dir.path(), "node_modules/x/index.js", "module.exports = 1;");

        let files = FileScanner::new(dir.path())
            .with_exclude(&["node_modules/**".to_string()])
            .scan()
            .unwrap();

        let paths: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(paths, vec!["src/a.rs", "src/b.ts"]);
        assert_eq!(files[0].language, Language::Rust);
    }

    #[test]
    fn test_scan_skips_large_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "big.py", &"x = 1\n".repeat(100));
        write(dir.path(), "small.py", "x = 1\n");

        let files = FileScanner::new(dir.path())
            .with_max_file_size(50)
            .scan()
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, "small.py");
    }

    #[test]
    fn test_scan_respects_gitignore() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", "generated/\n");
        write(dir.path(), "generated/api.ts", "export function x() {}");
        write(dir.path(), "api.ts", "export function y() {}");

        let files = FileScanner::new(dir.path()).scan().unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(paths, vec!["api.ts"]);
    }
}
