//! Generate Command
//!
//! Run the documentation pipeline for one or more repositories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::cli::ui::Output;
use crate::cli::util::{
    CommandContext, cancel_on_ctrl_c, document_file_name, parse_repository_id, write_draft,
};
use crate::linter::Reporter;
use crate::pipeline::{Pipeline, PipelineOutput};
use crate::storage::VersionStore;
use crate::types::{DocForgeError, Result, short_hash};

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub repositories: Vec<String>,
    /// File for a single repository, directory for several
    pub output: Option<PathBuf>,
    pub lint: bool,
    pub save: bool,
}

pub async fn run(options: GenerateOptions) -> Result<()> {
    let context = if options.save {
        CommandContext::load_initialized()?
    } else {
        CommandContext::load()?
    };

    let ids = options
        .repositories
        .iter()
        .map(|r| parse_repository_id(r))
        .collect::<Result<Vec<_>>>()?;
    if ids.is_empty() {
        return Err(DocForgeError::Config(
            "At least one repository is required".to_string(),
        ));
    }

    let backend = context.backend()?;
    let mut pipeline = Pipeline::new(
        context.source()?,
        context.analyzer(),
        context.generator(backend),
    );
    if options.lint {
        pipeline = pipeline.with_linter(context.linter(false)?);
    }
    if options.save {
        let store: Arc<dyn VersionStore> = context.database()?;
        pipeline = pipeline.with_store(store);
    }

    info!(repositories = ids.len(), "Generating documentation");
    let cancel = cancel_on_ctrl_c();
    let results = pipeline.run_many(&ids, &cancel).await;

    let several = ids.len() > 1;
    let mut first_error = None;
    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(output) => {
                let target = options.output.as_deref().map(|path| {
                    if several {
                        path.join(document_file_name(id))
                    } else {
                        path.to_path_buf()
                    }
                });
                report(&output, target.as_deref())?;
            }
            Err(e) => {
                Output::error(&e.to_string());
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn report(output: &PipelineOutput, target: Option<&Path>) -> Result<()> {
    let document = &output.document;

    match target {
        Some(path) => {
            write_draft(path, document)?;
            Output::success(&format!(
                "{}: draft written to {}",
                output.repository.id,
                path.display()
            ));
        }
        None => {
            println!("{}", document.text());
        }
    }

    Output::field("Files", output.summary.len());
    Output::field("Fingerprint", short_hash(document.fingerprint()));
    if let Some(version) = &output.version {
        Output::field("Saved as", format!("version {}", version.version));
    }
    if let Some(report) = &output.report {
        println!();
        Reporter::print_summary(report);
    }
    println!();
    Ok(())
}
