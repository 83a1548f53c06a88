//! Error types for the ingestion pipeline
//!
//! Row-level validation failures are not errors; they are collected into the
//! [`IngestionResult`](tally_common::types::IngestionResult). Everything here
//! is fatal to a single parse call.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// The worker could not be constructed at all. Callers may fall back to
    /// [`ChunkedExecutor::parse`](crate::executor::ChunkedExecutor::parse).
    #[error("Worker initialization failed: {0}")]
    WorkerInit(String),

    #[error("Failed to read '{}': {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reported by the worker through its `error` message.
    #[error("{0}")]
    Worker(String),

    /// The worker stopped without sending a terminal message.
    #[error("Worker terminated unexpectedly before finishing the parse")]
    WorkerCrashed,

    #[error("Parse cancelled")]
    Cancelled,
}

impl IngestError {
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }
}
