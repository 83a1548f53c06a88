//! Fixed-interval job status polling
//!
//! Each tick reads the active set fresh from the registry, fetches every
//! active job's status concurrently, and merges the results back one by one.
//! A job drops out of the poll set as soon as the registry sees it terminal.
//!
//! There is no timeout: a job the runner never finishes is polled until the
//! poller is shut down.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::JobStatusSource;
use crate::error::{JobError, Result};
use crate::registry::JobRegistry;
use crate::types::BatchJob;

/// Interval between status requests, for the fleet poller and single-job
/// monitor alike.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

pub struct JobPoller<S: ?Sized> {
    source: Arc<S>,
    registry: JobRegistry,
}

impl<S: ?Sized> Clone for JobPoller<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            registry: self.registry.clone(),
        }
    }
}

impl<S> JobPoller<S>
where
    S: JobStatusSource + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, registry: JobRegistry) -> Self {
        Self { source, registry }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Poll every currently active job once. Returns how many were polled.
    ///
    /// A failed request is logged and leaves the job active for the next tick.
    pub async fn tick(&self) -> usize {
        let ids = self.registry.active_ids().await;
        if ids.is_empty() {
            return 0;
        }

        let requests = ids.iter().map(|id| {
            let source = Arc::clone(&self.source);
            async move { (id.as_str(), source.fetch_status(id).await) }
        });
        let results = join_all(requests).await;

        for (id, result) in results {
            match result {
                Ok(update) => {
                    self.registry.merge(id, &update).await;
                },
                Err(e) => warn!(job_id = id, error = %e, "Status poll failed, will retry"),
            }
        }

        debug!(polled = ids.len(), "Poll tick complete");
        ids.len()
    }

    /// Poll at [`POLL_INTERVAL`] until `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        info!("Job poller stopped");
    }

    /// Run the poller on its own task.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Poll a single job until the registry holds it in a terminal state,
    /// then return that final record.
    pub async fn watch_job(&self, job_id: &str) -> Result<BatchJob> {
        loop {
            let job = self
                .registry
                .get(job_id)
                .await
                .ok_or_else(|| JobError::UnknownJob(job_id.to_string()))?;

            if job.is_terminal() {
                return Ok(job);
            }

            match self.source.fetch_status(job_id).await {
                Ok(update) => {
                    if let Some(job) = self.registry.merge(job_id, &update).await {
                        if job.is_terminal() {
                            return Ok(job);
                        }
                    }
                },
                Err(e) => warn!(job_id, error = %e, "Status poll failed, will retry"),
            }

            sleep(POLL_INTERVAL).await;
        }
    }
}
