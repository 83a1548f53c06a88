//! Tally Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the Tally workspace.
//!
//! # Overview
//!
//! This crate provides functionality used by every Tally workspace member:
//!
//! - **Error Handling**: Common error type and result alias
//! - **Environment**: Typed environment-variable lookups for binaries
//! - **Logging**: Centralized `tracing` subscriber setup
//! - **Types**: The transaction ingestion data model (rows, records, results)
//!
//! # Example
//!
//! ```no_run
//! use tally_common::types::{FieldValue, TransactionRecord};
//!
//! let record = TransactionRecord::from_fields(2, [("amount".to_string(), FieldValue::Number(4.5))]);
//! assert_eq!(record.get("amount").and_then(FieldValue::as_f64), Some(4.5));
//! assert_eq!(record.row_number(), 2);
//! ```

pub mod env;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, TallyError};
