//! In-memory job registry
//!
//! The only shared mutable state in the job subsystem. Every mutation happens
//! under one write lock and touches a single job by id, so concurrent poll
//! results for different jobs cannot clobber each other.
//!
//! Jobs are partitioned by status: active (`pending`, `processing`) jobs are
//! polled, completed (`completed`, `failed`, `cancelled`) jobs are not. The
//! registry is not persisted and never evicts.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::types::{BatchJob, JobStatusUpdate};

#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<String, BatchJob>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new job. Returns `false` (and changes nothing) if the id is
    /// already registered.
    pub async fn insert(&self, job: BatchJob) -> bool {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return false;
        }
        debug!(job_id = %job.id, status = %job.status, "Registered job");
        jobs.insert(job.id.clone(), job);
        true
    }

    pub async fn get(&self, job_id: &str) -> Option<BatchJob> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Merge a status response into the job with `job_id`.
    ///
    /// Unknown ids are ignored. Returns the job as it stands after the merge.
    pub async fn merge(&self, job_id: &str, update: &JobStatusUpdate) -> Option<BatchJob> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(job_id)?;

        let was_terminal = job.is_terminal();
        if job.apply(update, Utc::now()) && !was_terminal && job.is_terminal() {
            info!(job_id, status = %job.status, error = ?job.error, "Job finished");
        }

        Some(job.clone())
    }

    /// Optimistically mark an active job as cancelled.
    ///
    /// Returns `false` if the job is unknown or already terminal; calling it
    /// again is harmless.
    pub async fn mark_cancelled(&self, job_id: &str) -> bool {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(job_id) {
            Some(job) if job.status.is_active() => {
                job.mark_cancelled();
                true
            },
            _ => false,
        }
    }

    pub async fn is_active(&self, job_id: &str) -> bool {
        self.jobs
            .read()
            .await
            .get(job_id)
            .is_some_and(|job| job.status.is_active())
    }

    /// Ids of every job that should still be polled.
    pub async fn active_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| job.status.is_active())
            .map(|job| job.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Pending and processing jobs, newest first.
    pub async fn active_jobs(&self) -> Vec<BatchJob> {
        self.collect(|job| job.status.is_active()).await
    }

    /// Completed, failed, and cancelled jobs, newest first.
    pub async fn completed_jobs(&self) -> Vec<BatchJob> {
        self.collect(BatchJob::is_terminal).await
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    async fn collect(&self, keep: impl Fn(&BatchJob) -> bool) -> Vec<BatchJob> {
        let mut jobs: Vec<BatchJob> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| keep(job))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        jobs
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::{JobStatus, JobType, CANCELLED_BY_USER};

    fn pending(id: &str) -> BatchJob {
        BatchJob::pending(id, JobType::Indexing, id, "proj", 10)
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let registry = JobRegistry::new();
        assert!(registry.insert(pending("a")).await);
        assert!(!registry.insert(pending("a")).await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_partition_follows_status() {
        let registry = JobRegistry::new();
        registry.insert(pending("a")).await;
        registry.insert(pending("b")).await;

        registry
            .merge(
                "b",
                &JobStatusUpdate {
                    status: Some(JobStatus::Completed),
                    progress_percent: Some(100.0),
                    ..Default::default()
                },
            )
            .await;

        let active: Vec<_> = registry.active_jobs().await.into_iter().map(|j| j.id).collect();
        let completed: Vec<_> = registry.completed_jobs().await.into_iter().map(|j| j.id).collect();
        assert_eq!(active, vec!["a"]);
        assert_eq!(completed, vec!["b"]);
        assert_eq!(registry.active_ids().await, vec!["a"]);
    }

    #[tokio::test]
    async fn test_merge_unknown_id_is_ignored() {
        let registry = JobRegistry::new();
        assert!(registry.merge("ghost", &JobStatusUpdate::default()).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_mark_cancelled_is_idempotent() {
        let registry = JobRegistry::new();
        registry.insert(pending("a")).await;

        assert!(registry.mark_cancelled("a").await);
        assert!(!registry.mark_cancelled("a").await);
        assert!(!registry.mark_cancelled("missing").await);

        let job = registry.get("a").await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some(CANCELLED_BY_USER));
        assert_eq!(registry.len().await, 1);
        assert!(!registry.is_active("a").await);
    }
}
