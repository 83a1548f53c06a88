//! Tally Jobs Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Client-side lifecycle of server-side batch jobs: submit a parsed dataset,
//! poll the job until it finishes, cancel it.
//!
//! # Overview
//!
//! - [`JobApiClient`]: reqwest client for the job runner endpoints
//! - [`BatchJobs`]: submit/cancel commands with optimistic registry updates
//! - [`JobRegistry`]: in-memory job records, active vs. completed
//! - [`JobPoller`]: fixed-interval reconciliation of active jobs
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tally_jobs::{BatchJobs, JobApiClient, JobClientConfig, JobType};
//!
//! #[tokio::main]
//! async fn main() -> tally_jobs::Result<()> {
//!     let api = Arc::new(JobApiClient::new(JobClientConfig::new("http://localhost:8000"))?);
//!     let jobs = BatchJobs::new(api, "default");
//!
//!     let items = vec![serde_json::json!({"amount": 4.5})];
//!     let job_id = jobs.submit(JobType::Validation, &items, "March").await?;
//!     let job = jobs.poller().watch_job(&job_id).await?;
//!     println!("{} finished as {}", job.id, job.status);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod poller;
pub mod registry;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use backend::{JobBackend, JobStatusSource};
pub use client::{JobApiClient, JobClientConfig};
pub use error::{JobError, Result};
pub use poller::{JobPoller, POLL_INTERVAL};
pub use registry::JobRegistry;
pub use service::BatchJobs;
pub use types::{BatchJob, JobStatus, JobStatusUpdate, JobType};
