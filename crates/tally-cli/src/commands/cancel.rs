//! `tally cancel` command implementation

use crate::config::Config;
use crate::error::Result;
use colored::Colorize;
use tally_jobs::{JobApiClient, JobBackend};

/// Ask the runner to cancel `job_id`.
///
/// Unlike the cancel issued while watching a job, there is no local record to
/// mark here, so a refused request is reported as an error.
pub async fn run(job_id: &str, config: &Config) -> Result<()> {
    let api = JobApiClient::new(config.job_client_config())?;
    api.cancel(job_id).await?;

    println!("{} for job {}", "Cancellation requested".yellow().bold(), job_id);
    Ok(())
}
