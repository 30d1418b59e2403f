//! Config Command
//!
//! Usage:
//!   docforge config show [-f json]
//!   docforge config path
//!   docforge config init [-g] [--force]

use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Print the merged effective configuration
pub fn show(format: &str) -> Result<()> {
    ConfigLoader::show_config(format == "json")
}

pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

pub fn init_global(force: bool) -> Result<()> {
    let dir = ConfigLoader::init_global(force)?;
    Output::success("Initialized global configuration");
    Output::field("Directory", dir.display());
    if let Some(config_path) = ConfigLoader::global_config_path() {
        Output::field("Config", config_path.display());
    }
    Ok(())
}

pub fn init_project() -> Result<()> {
    let root = std::env::current_dir()?;
    let dir = ConfigLoader::init_project_in(&root, None)?;
    Output::success("Initialized project configuration");
    Output::field("Directory", dir.display());
    Output::field("Config", ConfigLoader::project_config_path().display());
    Ok(())
}
