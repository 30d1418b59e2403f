//! Check Command
//!
//! Check the configured model backend before doing any work.

use std::time::Duration;

use crate::ai::with_timeout;
use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::constants::network;
use crate::types::{DocForgeError, Result};

pub async fn run(format: &str) -> Result<()> {
    let context = CommandContext::load()?;
    let backend = context.backend()?;

    let status = with_timeout(
        Duration::from_secs(network::HEALTH_CHECK_TIMEOUT_SECS + 1),
        backend.health_check(),
        "backend health check",
    )
    .await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        Output::header("Backend Status");
        Output::field("Provider", &status.provider);
        Output::field("Endpoint", &status.endpoint);
        Output::field("Model", &status.model);
        println!();
        if status.is_ready() {
            Output::success(&format!("Connected: {}", status.detail));
        } else if status.reachable {
            Output::warning(&status.detail);
        } else {
            Output::error(&status.detail);
        }
    }

    if !status.reachable {
        return Err(DocForgeError::connection(status.endpoint, status.detail));
    }
    if !status.model_available {
        return Err(DocForgeError::model(status.model, status.detail));
    }
    Ok(())
}
