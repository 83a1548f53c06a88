//! Tally Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Parses delimited transaction files off the caller's task and reports
//! chunked progress.
//!
//! # Pipeline
//!
//! - **Tokenizer**: raw text into rows of string fields (quote-aware)
//! - **Validator**: required-field and amount checks per row
//! - **Transformer**: accepted rows into typed [`TransactionRecord`]s
//! - **Executor**: drives the three over fixed-size chunks
//! - **Worker**: an actor hosting the executor, reachable only by messages
//! - **Client**: the caller-facing facade that owns one worker
//!
//! # Example
//!
//! ```no_run
//! use tally_ingest::{IngestionClient, ParseOptions};
//!
//! #[tokio::main]
//! async fn main() -> tally_ingest::Result<()> {
//!     let client = IngestionClient::new(ParseOptions::default());
//!     let result = client.parse_file("./statements/march.csv").await?;
//!     println!("{} valid / {} invalid", result.stats.valid_rows, result.stats.invalid_rows);
//!     Ok(())
//! }
//! ```
//!
//! [`TransactionRecord`]: tally_common::types::TransactionRecord

pub mod client;
pub mod error;
pub mod executor;
pub mod protocol;
pub mod tokenizer;
pub mod transformer;
pub mod validator;
pub mod worker;

// Re-export commonly used types
pub use client::{IngestionClient, IngestionState};
pub use error::{IngestError, Result};
pub use executor::{ChunkedExecutor, ParseOptions, DEFAULT_CHUNK_SIZE};
pub use protocol::{ParsePayload, WorkerRequest, WorkerResponse};
pub use worker::WorkerChannel;
