//! History Command
//!
//! List saved versions or print one of them.

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, parse_repository_id};
use crate::storage::VersionStore;
use crate::types::{DocForgeError, Result, short_hash};

pub fn run(repository: &str, show: Option<u32>, format: &str) -> Result<()> {
    let context = CommandContext::load_initialized()?;
    let id = parse_repository_id(repository)?;
    let db = context.database()?;

    if let Some(number) = show {
        let record = db.get(&id, number)?.ok_or_else(|| {
            DocForgeError::Storage(format!("{} has no version {}", id, number))
        })?;
        if format == "json" {
            println!("{}", serde_json::to_string_pretty(&record)?);
        } else {
            print!("{}", record.content);
        }
        return Ok(());
    }

    let versions = db.list(&id)?;
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&versions)?);
        return Ok(());
    }

    if versions.is_empty() {
        Output::warning(&format!("No saved versions for {}", id));
        return Ok(());
    }

    Output::header(&format!("History: {}", id));
    for record in &versions {
        println!(
            "  v{:<4} {}  {}  {}",
            record.version,
            record.saved_at.format("%Y-%m-%d %H:%M:%S"),
            short_hash(&record.content_hash),
            record.note.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
