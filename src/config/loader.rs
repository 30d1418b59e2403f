//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/docforge/config.toml)
//! 3. Project config (.docforge/config.toml)
//! 4. Environment variables (DOCFORGE_* prefix)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{DocForgeError, Result};

const PROJECT_DIR: &str = ".docforge";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "docforge.db";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the current directory:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        Self::load_in(Path::new("."))
    }

    /// Load configuration treating `root` as the project directory
    pub fn load_in(root: &Path) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path_in(root);
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // DOCFORGE_BACKEND_MODEL -> backend.model
        figment = figment.merge(Env::prefixed("DOCFORGE_").split('_').lowercase(true));

        let config: Config = figment.extract()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/docforge/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("docforge"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_config_path_in(Path::new("."))
    }

    fn project_config_path_in(root: &Path) -> PathBuf {
        root.join(PROJECT_DIR).join(CONFIG_FILE)
    }

    /// Version database inside a project directory
    pub fn database_path_in(root: &Path) -> PathBuf {
        root.join(PROJECT_DIR).join(DATABASE_FILE)
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:   {} {}", exists, global.display());
        } else {
            println!("  Global:   (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project:  {} {}", exists, project.display());

        let database = Self::database_path_in(Path::new("."));
        let exists = if database.exists() { "✓" } else { "✗" };
        println!("  Database: {} {}", exists, database.display());
    }

    /// Show current effective configuration
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load()?;

        if as_json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config)
                    .map_err(|e| DocForgeError::Config(e.to_string()))?
            );
        }

        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            DocForgeError::Config("Cannot determine global config directory".to_string())
        })?;

        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join(CONFIG_FILE);
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_global_config())?;
            info!("Created global config: {}", config_path.display());
        } else {
            info!("Global config exists: {}", config_path.display());
        }

        Ok(global_dir)
    }

    /// Initialize project configuration under `root`
    pub fn init_project_in(root: &Path, repositories_root: Option<&Path>) -> Result<PathBuf> {
        let project_dir = root.join(PROJECT_DIR);
        fs::create_dir_all(&project_dir)?;

        let config_path = project_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            fs::write(&config_path, Self::default_project_config(repositories_root))?;
            info!("Created project config: {}", config_path.display());
        }

        Ok(project_dir)
    }

    /// Check if a project is initialized under `root`
    pub fn is_project_initialized_in(root: &Path) -> bool {
        root.join(PROJECT_DIR).is_dir()
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn default_global_config() -> String {
        r#"# DocForge Global Configuration
# User-wide defaults. Project settings in .docforge/config.toml override these.

version = "1.0"

[backend]
provider = "ollama"
model = "llama3:latest"
timeout_secs = 120

[retry]
max_attempts = 3
base_delay_ms = 500
max_delay_ms = 10000
"#
        .to_string()
    }

    fn default_project_config(repositories_root: Option<&Path>) -> String {
        let root_line = match repositories_root {
            Some(path) => format!("root = {:?}", path.display().to_string()),
            None => "# root = \"/path/to/checkouts\"".to_string(),
        };
        format!(
            r#"# DocForge Project Configuration
# Project-specific settings that override global defaults.

version = "1.0"

[repositories]
{}
default_branch = "main"

# [[repositories.entries]]
# id = "acme/api"
# path = "../api"

[lint]
semantic = true
required_sections = []

[analysis]
exclude = [
    "node_modules/**",
    "dist/**",
    ".git/**",
    "target/**",
    "build/**",
]
"#,
            root_line
        )
    }
}
