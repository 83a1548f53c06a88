//! Error types for Tally CLI
//!
//! User-facing errors with messages that say what to check next.

use tally_common::TallyError;
use tally_ingest::IngestError;
use tally_jobs::JobError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Parsing the input file failed as a whole
    #[error("Parse failed: {0}")]
    Ingest(#[from] IngestError),

    /// Talking to the job runner failed
    #[error("Job runner error: {0}. Ensure the server is reachable (see --server-url / TALLY_SERVER_URL).")]
    Job(#[from] JobError),

    /// The file parsed but no row survived validation
    #[error("Nothing to submit: '{0}' has no valid transactions. Run 'tally parse' to see the row errors.")]
    EmptyDataset(String),

    /// The watched job ended in failure
    #[error("Job {id} failed: {message}")]
    JobFailed { id: String, message: String },

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables or .env file.")]
    Config(String),

    /// JSON output failed
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<TallyError> for CliError {
    fn from(err: TallyError) -> Self {
        match err {
            TallyError::Serialization(e) => Self::Json(e),
            TallyError::Config(msg) => Self::Config(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_from_common() {
        let err: CliError = TallyError::config("TALLY_CHUNK_SIZE=\"x\" is invalid").into();
        assert!(matches!(err, CliError::Config(_)));
        assert!(err.to_string().contains("TALLY_CHUNK_SIZE"));
    }

    #[test]
    fn test_worker_error_message_passes_through() {
        let err: CliError = IngestError::Worker("No data found".to_string()).into();
        assert!(err.to_string().contains("No data found"));
    }
}
