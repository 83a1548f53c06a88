//! `tally submit` command implementation
//!
//! Parses a file, submits the valid transactions, and watches the job until
//! the runner reports a terminal status. Ctrl-C while watching cancels the
//! job.

use crate::commands::parse::parse_with_progress;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::progress::{create_job_progress, describe_job, update_job_progress};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tally_jobs::types::CANCELLED_BY_USER;
use tally_jobs::{BatchJob, BatchJobs, JobApiClient, JobStatus, JobType, POLL_INTERVAL};
use tokio_util::sync::CancellationToken;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Submit `path` as a `job_type` job.
pub async fn run(
    path: &Path,
    job_type: JobType,
    name: Option<String>,
    watch: bool,
    config: &Config,
) -> Result<()> {
    let result = parse_with_progress(path, config).await?;
    if result.transactions.is_empty() {
        return Err(CliError::EmptyDataset(path.display().to_string()));
    }
    if result.stats.invalid_rows > 0 {
        println!(
            "{} {} invalid rows will not be submitted",
            "Warning:".yellow().bold(),
            result.stats.invalid_rows
        );
    }

    let name = name.unwrap_or_else(|| default_name(path));
    let api = Arc::new(JobApiClient::new(config.job_client_config())?);
    let jobs = BatchJobs::new(api, config.project_id.as_str());

    let job_id = jobs
        .submit_transactions(job_type, &result.transactions, &name)
        .await?;
    println!(
        "{} job {} ({} transactions, type {})",
        "Submitted".green().bold(),
        job_id,
        result.transactions.len(),
        job_type
    );

    if !watch {
        return Ok(());
    }

    let job = watch_until_terminal(&jobs, &job_id).await?;
    report(&job)
}

/// Job name derived from the file name.
fn default_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Run the background poller and redraw the bar from the registry until the
/// job is terminal. Ctrl-C cancels the job and stops watching.
async fn watch_until_terminal(jobs: &BatchJobs<JobApiClient>, job_id: &str) -> Result<BatchJob> {
    let shutdown = CancellationToken::new();
    let poller = jobs.poller().spawn(shutdown.clone());
    let pb = create_job_progress(job_id);
    let redraw = POLL_INTERVAL / 4;

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    let mut interrupted = false;

    let job = loop {
        tokio::select! {
            signal = &mut interrupt, if !interrupted => {
                interrupted = true;
                if signal.is_ok() {
                    info!(job_id, "Interrupted, cancelling job");
                    jobs.cancel(job_id).await;
                }
            },
            _ = tokio::time::sleep(redraw) => {},
        }

        let Some(job) = jobs.registry().get(job_id).await else {
            break None;
        };
        update_job_progress(&pb, &job);
        if job.is_terminal() {
            break Some(job);
        }
    };

    shutdown.cancel();
    join_poller(poller, job_id).await;

    match job {
        Some(job) => {
            pb.finish_with_message(describe_job(&job));
            Ok(job)
        },
        None => {
            pb.abandon();
            Err(tally_jobs::JobError::UnknownJob(job_id.to_string()).into())
        },
    }
}

/// Wait for the poller task; a panic inside it is logged, not propagated.
async fn join_poller(handle: JoinHandle<()>, job_id: &str) {
    if let Err(e) = handle.await {
        warn!(job_id, error = %e, "Job poller task ended abnormally");
    }
}

fn report(job: &BatchJob) -> Result<()> {
    match job.status {
        JobStatus::Completed => {
            println!("{} job {}", "Completed".green().bold(), job.id);
            if let Some(rate) = job.success_rate {
                println!("  Success rate: {:.1}%", rate * 100.0);
            }
            Ok(())
        },
        JobStatus::Cancelled => {
            println!("{} job {}", "Cancelled".yellow().bold(), job.id);
            Ok(())
        },
        JobStatus::Failed if job.error.as_deref() == Some(CANCELLED_BY_USER) => {
            println!("{} job {}", "Cancelled".yellow().bold(), job.id);
            Ok(())
        },
        _ => Err(CliError::JobFailed {
            id: job.id.clone(),
            message: job.error.clone().unwrap_or_else(|| "no error message".to_string()),
        }),
    }
}
