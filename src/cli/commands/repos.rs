//! Repos Command
//!
//! List candidate repositories, optionally filtered by a search query.

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::types::Result;

pub fn run(query: Option<&str>, format: &str) -> Result<()> {
    let context = CommandContext::load()?;
    let source = context.source()?;
    let repositories = match query {
        Some(query) => source.search(query)?,
        None => source.list()?,
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&repositories)?);
        return Ok(());
    }

    if repositories.is_empty() {
        match query {
            Some(query) => Output::warning(&format!("No repositories match '{}'", query)),
            None => {
                Output::warning("No repositories found.");
                Output::dim("Set repositories.root or add [[repositories.entries]] to the config.");
            }
        }
        return Ok(());
    }

    for repository in &repositories {
        println!(
            "{:<40} {:<12} {}",
            repository.id.as_str(),
            repository.default_branch,
            repository.location.display()
        );
    }
    Output::dim(&format!("\n{} repositories", repositories.len()));
    Ok(())
}
