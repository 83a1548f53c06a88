//! Batch job types
//!
//! Wire types mirror the job runner's JSON (snake_case). [`BatchJob`] is the
//! local record kept in the [`JobRegistry`](crate::registry::JobRegistry).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Kind of processing the job runner performs on submitted items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Ocr,
    EntityResolution,
    Validation,
    Indexing,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Ocr => "ocr",
            JobType::EntityResolution => "entity_resolution",
            JobType::Validation => "validation",
            JobType::Indexing => "indexing",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "ocr" => Ok(JobType::Ocr),
            "entity_resolution" => Ok(JobType::EntityResolution),
            "validation" => Ok(JobType::Validation),
            "indexing" => Ok(JobType::Indexing),
            _ => Err(format!(
                "unknown job type '{}' (expected ocr, entity_resolution, validation, indexing)",
                s
            )),
        }
    }
}

/// Job lifecycle: `pending → processing → {completed | failed | cancelled}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[serde(alias = "queued")]
    Pending,
    #[serde(alias = "running")]
    Processing,
    Completed,
    Failed,
    #[serde(alias = "canceled")]
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// No further transitions happen from a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" | "queued" => Ok(JobStatus::Pending),
            "processing" | "running" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" | "canceled" => Ok(JobStatus::Cancelled),
            _ => Err(format!("unknown job status '{}'", s)),
        }
    }
}

/// Decode `status` without failing the whole response on a value this
/// client does not know; such a status is treated as absent.
fn lenient_status<'de, D>(deserializer: D) -> std::result::Result<Option<JobStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| match s.parse() {
        Ok(status) => Some(status),
        Err(_) => {
            warn!(status = %s, "Ignoring unrecognized job status");
            None
        },
    }))
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Body of `POST /batch-jobs/submit`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub data_type: JobType,
    pub items: Vec<serde_json::Value>,
    pub project_id: String,
}

/// Response of `POST /batch-jobs/submit`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
}

/// Response of `GET /batch-jobs/{id}`
///
/// Every field is optional: only the fields present are merged into the
/// local record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatusUpdate {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub progress_percent: Option<f64>,
    #[serde(default)]
    pub items_processed: Option<u64>,
    #[serde(default)]
    pub items_failed: Option<u64>,
    #[serde(default)]
    pub total_items: Option<u64>,
    #[serde(default)]
    pub total_batches: Option<u64>,
    #[serde(default)]
    pub batches_completed: Option<u64>,
    #[serde(default)]
    pub success_rate: Option<f64>,
    #[serde(default)]
    pub estimated_completion_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl JobStatusUpdate {
    /// Seconds from `now` until the reported completion time, floored at 0.
    pub fn eta_seconds(&self, now: DateTime<Utc>) -> Option<u64> {
        self.estimated_completion_time
            .map(|at| (at - now).num_seconds().max(0) as u64)
    }
}

// ============================================================================
// Local record
// ============================================================================

/// Error text recorded when the operator cancels a job.
pub const CANCELLED_BY_USER: &str = "Cancelled by user";

/// Local view of one submitted job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob {
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub status: JobStatus,
    /// 0..=100
    pub progress: f64,
    pub items_processed: u64,
    pub items_failed: u64,
    pub total_items: u64,
    pub total_batches: Option<u64>,
    pub batches_completed: Option<u64>,
    pub success_rate: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub project_id: String,
    pub name: String,
    /// Seconds until the runner expects to finish
    pub eta: Option<u64>,
    pub error: Option<String>,
}

impl BatchJob {
    /// The optimistic record inserted right after a successful submit.
    pub fn pending(
        id: impl Into<String>,
        job_type: JobType,
        name: impl Into<String>,
        project_id: impl Into<String>,
        total_items: u64,
    ) -> Self {
        Self {
            id: id.into(),
            job_type,
            status: JobStatus::Pending,
            progress: 0.0,
            items_processed: 0,
            items_failed: 0,
            total_items,
            total_batches: None,
            batches_completed: None,
            success_rate: None,
            created_at: Utc::now(),
            project_id: project_id.into(),
            name: name.into(),
            eta: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Merge a status response, overwriting only the fields it carries.
    ///
    /// A terminal record only accepts updates that are themselves terminal, so
    /// a late non-terminal response can never reopen a finished (or locally
    /// cancelled) job. Returns whether anything was applied.
    pub fn apply(&mut self, update: &JobStatusUpdate, now: DateTime<Utc>) -> bool {
        let was_terminal = self.is_terminal();
        if was_terminal && !update.status.is_some_and(|s| s.is_terminal()) {
            return false;
        }

        if let Some(status) = update.status {
            // A reconciling or successful status replaces any earlier error,
            // including the local cancellation marker.
            if was_terminal || status == JobStatus::Completed {
                self.error = None;
            }
            self.status = status;
        }
        if let Some(progress) = update.progress_percent {
            self.progress = progress.clamp(0.0, 100.0);
        }
        if let Some(n) = update.items_processed {
            self.items_processed = n;
        }
        if let Some(n) = update.items_failed {
            self.items_failed = n;
        }
        if let Some(n) = update.total_items {
            self.total_items = n;
        }
        if update.total_batches.is_some() {
            self.total_batches = update.total_batches;
        }
        if update.batches_completed.is_some() {
            self.batches_completed = update.batches_completed;
        }
        if update.success_rate.is_some() {
            self.success_rate = update.success_rate;
        }
        if let Some(eta) = update.eta_seconds(now) {
            self.eta = Some(eta);
        }
        if let Some(ref message) = update.error_message {
            self.error = Some(message.clone());
        }

        true
    }

    /// Optimistic local cancel: the job becomes terminal immediately.
    pub fn mark_cancelled(&mut self) {
        self.status = JobStatus::Failed;
        self.error = Some(CANCELLED_BY_USER.to_string());
        self.eta = None;
    }
}
