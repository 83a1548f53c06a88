//! Error types for the batch job client

use thiserror::Error;

/// Result type alias for job operations
pub type Result<T> = std::result::Result<T, JobError>;

#[derive(Error, Debug)]
pub enum JobError {
    /// Transport failure or undecodable response body
    #[error("Network request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The job runner answered with a non-success status
    #[error("Job runner returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown job: {0}")]
    UnknownJob(String),
}

impl JobError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}
