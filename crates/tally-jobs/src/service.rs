//! Batch job commands: submit and cancel with optimistic local state
//!
//! Commands update the [`JobRegistry`] immediately; the [`JobPoller`] later
//! reconciles each record with what the runner reports.

use serde::Serialize;
use std::sync::Arc;
use tally_common::types::TransactionRecord;
use tracing::{info, instrument, warn};

use crate::backend::JobBackend;
use crate::error::Result;
use crate::poller::JobPoller;
use crate::registry::JobRegistry;
use crate::types::{BatchJob, JobType, SubmitRequest};

pub struct BatchJobs<B: ?Sized> {
    backend: Arc<B>,
    registry: JobRegistry,
    project_id: String,
}

impl<B> BatchJobs<B>
where
    B: JobBackend + ?Sized + 'static,
{
    pub fn new(backend: Arc<B>, project_id: impl Into<String>) -> Self {
        Self {
            backend,
            registry: JobRegistry::new(),
            project_id: project_id.into(),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// A poller sharing this service's backend and registry.
    pub fn poller(&self) -> JobPoller<B> {
        JobPoller::new(Arc::clone(&self.backend), self.registry.clone())
    }

    /// Submit `items` and register the job as `pending` before returning its id.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn submit<T: Serialize>(
        &self,
        job_type: JobType,
        items: &[T],
        name: &str,
    ) -> Result<String> {
        let items = items
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let total_items = items.len() as u64;

        let request = SubmitRequest {
            data_type: job_type,
            items,
            project_id: self.project_id.clone(),
        };

        let job_id = self.backend.submit(&request).await?;
        info!(job_id = %job_id, "Job submitted");

        let job = BatchJob::pending(job_id.clone(), job_type, name, self.project_id.clone(), total_items);
        if !self.registry.insert(job).await {
            warn!(job_id = %job_id, "Runner returned an id that is already registered");
        }

        Ok(job_id)
    }

    /// Submit parsed transactions.
    pub async fn submit_transactions(
        &self,
        job_type: JobType,
        transactions: &[TransactionRecord],
        name: &str,
    ) -> Result<String> {
        self.submit(job_type, transactions, name).await
    }

    /// Cancel a job.
    ///
    /// The registry marks the job failed ("Cancelled by user") before the
    /// request is even sent, and stays that way whatever the runner answers.
    /// Returns whether the local record was changed.
    #[instrument(skip(self))]
    pub async fn cancel(&self, job_id: &str) -> bool {
        let marked = self.registry.mark_cancelled(job_id).await;

        match self.backend.cancel(job_id).await {
            Ok(()) => info!("Cancellation accepted by runner"),
            Err(e) => warn!(error = %e, "Cancellation request failed; job stays cancelled locally"),
        }

        marked
    }
}
