use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use matchday_core::PredictionBatch;

use crate::cli::OutputFormat;
use crate::client::MatchdayClient;
use crate::output::{print_batch, print_success};

pub async fn push(client: &MatchdayClient, file: Option<&Path>) -> Result<()> {
    let bytes = match file {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read batch from stdin")?;
            buf
        }
    };

    // Reject locally what the server would reject as a malformed body
    let batch = PredictionBatch::from_json_slice(&bytes).context("Invalid prediction batch")?;
    if let Err(e) = batch.validate_labels() {
        eprintln!("{} {e}", "warning:".yellow());
    }

    let message = client.push(&batch).await?;
    print_success(&format!("{message} ({} records)", batch.len()));
    Ok(())
}

pub async fn fetch(
    client: &MatchdayClient,
    header: &str,
    secret: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let batch = client.fetch(header, secret).await?;
    print_batch(&batch, format)
}
