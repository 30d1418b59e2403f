//! Analyze Command
//!
//! Print the code summary the generator would receive.

use std::collections::BTreeMap;
use std::path::Path;

use crate::analyzer::Language;
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, parse_repository_id};
use crate::types::{CodeSummary, Result, short_hash};

pub fn run(repository: &str, format: &str) -> Result<()> {
    let context = CommandContext::load()?;
    let id = parse_repository_id(repository)?;
    let repository = context.source()?.fetch(&id)?;
    let summary = context.analyzer().analyze(&repository)?;

    if format == "json" {
        let output = serde_json::json!({
            "repository": repository.id,
            "default_branch": repository.default_branch,
            "fingerprint": summary.fingerprint(),
            "units": summary.units,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    Output::header(&format!("Code Summary: {}", repository.id));
    Output::field("Location", repository.location.display());
    Output::field("Branch", &repository.default_branch);
    Output::field("Files", summary.len());
    Output::field("Symbols", summary.symbol_count());
    Output::field("Fingerprint", short_hash(&summary.fingerprint()));

    print_languages(&summary);

    let entry_points: Vec<&str> = summary.entry_points().map(|u| u.path.as_str()).collect();
    if !entry_points.is_empty() {
        println!("\nEntry points:");
        for path in entry_points {
            println!("  {}", path);
        }
    }

    if summary.has_endpoints() {
        println!("\nEndpoints:");
        for unit in &summary.units {
            for endpoint in unit.endpoints() {
                println!("  {:<32} {}", endpoint, unit.path);
            }
        }
    }

    if summary.is_empty() {
        println!();
        Output::warning("No source files found; generation would fail for this repository.");
    }

    Ok(())
}

fn print_languages(summary: &CodeSummary) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for unit in &summary.units {
        *counts
            .entry(Language::from_path(Path::new(&unit.path)).to_string())
            .or_default() += 1;
    }
    if counts.is_empty() {
        return;
    }

    println!("\nLanguages:");
    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    for (language, count) in sorted {
        println!("  {}: {} files", language, count);
    }
}
