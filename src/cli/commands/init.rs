//! Init Command
//!
//! Initialize DocForge in the current directory.

use std::path::Path;

use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::storage::Database;
use crate::types::{DocForgeError, Result};

pub fn run(force: bool, repositories_root: Option<&Path>) -> Result<()> {
    let root = std::env::current_dir()?;
    init_in(&root, force, repositories_root)?;

    if let Err(e) = ConfigLoader::init_global(false) {
        tracing::debug!("Global config init skipped: {}", e);
    }

    Output::success("Initialized DocForge in .docforge/");
    println!();
    println!("Next steps:");
    println!("  1. Run 'docforge check' to verify the model backend");
    println!("  2. Run 'docforge repos' to list repositories");
    println!("  3. Run 'docforge generate <owner/name>' to draft documentation");
    Ok(())
}

/// Create the project directory, config and version database under `root`
pub fn init_in(root: &Path, force: bool, repositories_root: Option<&Path>) -> Result<()> {
    if ConfigLoader::is_project_initialized_in(root) && !force {
        return Err(DocForgeError::Config(
            "Already initialized. Use --force to overwrite.".to_string(),
        ));
    }

    ConfigLoader::init_project_in(root, repositories_root)?;

    let db = Database::open(ConfigLoader::database_path_in(root))?;
    db.initialize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_database_and_refuses_twice() {
        let dir = tempfile::TempDir::new().unwrap();

        init_in(dir.path(), false, None).unwrap();
        assert!(ConfigLoader::database_path_in(dir.path()).exists());
        assert!(ConfigLoader::is_project_initialized_in(dir.path()));

        assert!(init_in(dir.path(), false, None).is_err());
        assert!(init_in(dir.path(), true, None).is_ok());
    }
}
