//! `tally parse` command implementation
//!
//! Parses a file locally and prints what would be submitted.

use crate::config::Config;
use crate::error::Result;
use crate::progress::{create_parse_progress, follow_ingestion};
use colored::Colorize;
use std::path::Path;
use tally_common::types::IngestionResult;
use tally_ingest::IngestionClient;

/// Row errors printed before the list is summarised.
const MAX_LISTED_ERRORS: usize = 20;

/// Parse `path` and print a summary (or the full result as JSON).
pub async fn run(path: &Path, json: bool, config: &Config) -> Result<()> {
    let result = parse_with_progress(path, config).await?;

    if json {
        println!("{}", result.to_json_pretty()?);
        return Ok(());
    }

    print_summary(path, &result);
    Ok(())
}

/// Parse a file on a fresh ingestion client, rendering progress to stderr.
pub(crate) async fn parse_with_progress(path: &Path, config: &Config) -> Result<IngestionResult> {
    let client = IngestionClient::new(config.parse_options());
    let pb = create_parse_progress(&format!("Parsing {}", path.display()));
    let follower = follow_ingestion(client.subscribe(), pb.clone());

    let result = client.parse_file(path).await;
    follower.abort();

    match result {
        Ok(result) => {
            pb.set_position(100);
            pb.finish_and_clear();
            Ok(result)
        },
        Err(e) => {
            pb.abandon();
            Err(e.into())
        },
    }
}

fn print_summary(path: &Path, result: &IngestionResult) {
    let stats = &result.stats;

    println!("{} {}", "Parsed".cyan().bold(), path.display());
    println!("  Columns:  {}", result.headers.join(", "));
    println!("  Rows:     {}", stats.total_rows);
    println!("  Valid:    {}", stats.valid_rows.to_string().green());
    if stats.invalid_rows > 0 {
        println!("  Invalid:  {}", stats.invalid_rows.to_string().red());
    } else {
        println!("  Invalid:  0");
    }

    if result.errors.is_empty() {
        return;
    }

    println!();
    println!("{}", "Rejected rows:".yellow().bold());
    for error in result.errors.iter().take(MAX_LISTED_ERRORS) {
        println!("  row {}: {}", error.row, error.errors.join("; "));
    }
    if result.errors.len() > MAX_LISTED_ERRORS {
        println!("  ... and {} more", result.errors.len() - MAX_LISTED_ERRORS);
    }
}
