//! Progress bar utilities for CLI operations
//!
//! Both bars are percentage based: the ingestion bar follows the client's
//! watch channel, the job bar is driven from registry snapshots.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tally_ingest::IngestionState;
use tally_jobs::BatchJob;
use tokio::sync::watch;
use tokio::task::JoinHandle;

fn percent_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// Bar for a local parse, 0..=100.
pub fn create_parse_progress(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(percent_style(
        "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}%",
    ));
    pb.set_message(message.to_string());
    pb
}

/// Bar for a remote job, 0..=100 with the runner's item counts as message.
pub fn create_job_progress(job_id: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(percent_style(
        "Job {prefix}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}% {msg}",
    ));
    pb.set_prefix(job_id.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Mirror an ingestion client's progress onto `pb` until the task is aborted
/// or the client goes away.
pub fn follow_ingestion(mut state: watch::Receiver<IngestionState>, pb: ProgressBar) -> JoinHandle<()> {
    tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let progress = state.borrow_and_update().progress;
            pb.set_position(u64::from(progress));
        }
    })
}

/// Render one registry snapshot of a job.
pub fn update_job_progress(pb: &ProgressBar, job: &BatchJob) {
    pb.set_position(job.progress.round() as u64);
    pb.set_message(describe_job(job));
}

/// Short status line: status, item counts, and ETA when known.
pub fn describe_job(job: &BatchJob) -> String {
    let mut line = format!(
        "{} ({}/{} items",
        job.status, job.items_processed, job.total_items
    );
    if job.items_failed > 0 {
        line.push_str(&format!(", {} failed", job.items_failed));
    }
    line.push(')');
    if let Some(eta) = job.eta.filter(|_| job.status.is_active()) {
        line.push_str(&format!(" eta {}", format_eta(eta)));
    }
    line
}

/// Format seconds as `1h 02m`, `3m 05s` or `42s`.
pub fn format_eta(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{}h {:02}m", h, m)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tally_jobs::{JobStatus, JobType};

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(0), "0s");
        assert_eq!(format_eta(42), "42s");
        assert_eq!(format_eta(185), "3m 05s");
        assert_eq!(format_eta(3720), "1h 02m");
    }

    #[test]
    fn test_describe_job() {
        let mut job = BatchJob::pending("job-1", JobType::Validation, "March", "proj", 10);
        job.status = JobStatus::Processing;
        job.items_processed = 4;
        job.items_failed = 1;
        job.eta = Some(65);

        assert_eq!(describe_job(&job), "processing (4/10 items, 1 failed) eta 1m 05s");

        job.status = JobStatus::Completed;
        assert_eq!(describe_job(&job), "completed (4/10 items, 1 failed)");
    }

    #[test]
    fn test_job_progress_rounds_percent() {
        let pb = create_job_progress("job-1");
        let mut job = BatchJob::pending("job-1", JobType::Ocr, "scan", "proj", 3);
        job.progress = 66.6;

        update_job_progress(&pb, &job);
        assert_eq!(pb.position(), 67);
        assert_eq!(pb.length(), Some(100));
        pb.finish_and_clear();
    }

    #[tokio::test]
    async fn test_follow_ingestion_tracks_state() {
        let (tx, rx) = watch::channel(IngestionState::default());
        let pb = create_parse_progress("parsing");
        let handle = follow_ingestion(rx, pb.clone());

        tx.send_modify(|s| s.progress = 40);
        drop(tx);
        handle.await.unwrap();

        assert_eq!(pb.position(), 40);
    }
}
