//! Seams between the job state machine and the job runner
//!
//! The poller only needs [`JobStatusSource`], so polling can be replaced by a
//! push feed (or a fake in tests) without touching registry or merge logic.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{JobStatusUpdate, SubmitRequest};

/// Something that can report the current status of a job.
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn fetch_status(&self, job_id: &str) -> Result<JobStatusUpdate>;
}

/// Full job runner interface: submit, query, cancel.
#[async_trait]
pub trait JobBackend: JobStatusSource {
    /// Submit a dataset, returning the runner's job id.
    async fn submit(&self, request: &SubmitRequest) -> Result<String>;

    /// Ask the runner to cancel a job.
    async fn cancel(&self, job_id: &str) -> Result<()>;
}
