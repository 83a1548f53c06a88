//! `tally status` command implementation
//!
//! One-off query of the runner's view of a job.

use crate::config::Config;
use crate::error::Result;
use crate::progress::format_eta;
use chrono::Utc;
use colored::Colorize;
use tally_jobs::{JobApiClient, JobStatus, JobStatusSource};

/// Print the current status of `job_id`.
pub async fn run(job_id: &str, config: &Config) -> Result<()> {
    let api = JobApiClient::new(config.job_client_config())?;
    let update = api.fetch_status(job_id).await?;

    let status = match update.status {
        Some(JobStatus::Completed) => "completed".green(),
        Some(status @ (JobStatus::Failed | JobStatus::Cancelled)) => status.as_str().red(),
        Some(status) => status.as_str().cyan(),
        None => "unknown".normal(),
    };

    println!("{} {}", "Job".cyan().bold(), job_id);
    println!("  Status:    {}", status);
    if let Some(progress) = update.progress_percent {
        println!("  Progress:  {:.1}%", progress);
    }
    if let (Some(processed), Some(total)) = (update.items_processed, update.total_items) {
        println!("  Items:     {}/{}", processed, total);
    }
    if let Some(failed) = update.items_failed.filter(|n| *n > 0) {
        println!("  Failed:    {}", failed);
    }
    if let (Some(done), Some(total)) = (update.batches_completed, update.total_batches) {
        println!("  Batches:   {}/{}", done, total);
    }
    if let Some(rate) = update.success_rate {
        println!("  Success:   {:.1}%", rate * 100.0);
    }
    if let Some(eta) = update.eta_seconds(Utc::now()) {
        println!("  ETA:       {}", format_eta(eta));
    }
    if let Some(ref message) = update.error_message {
        println!("  Error:     {}", message.red());
    }

    Ok(())
}
