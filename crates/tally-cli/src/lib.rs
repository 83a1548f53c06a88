//! Tally CLI Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Operator front end for the ingestion pipeline and the remote job runner.
//!
//! # Overview
//!
//! - **Parsing**: validate a transaction file locally (`tally parse`)
//! - **Submission**: parse, submit, and watch the resulting job (`tally submit`)
//! - **Job status**: one-off status query (`tally status`)
//! - **Cancellation**: ask the runner to stop a job (`tally cancel`)

pub mod commands;
pub mod config;
pub mod error;
pub mod progress;

// Re-export commonly used types
pub use config::Config;
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tally_jobs::JobType;

/// Tally - transaction file ingestion and batch job control
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Job runner URL
    #[arg(long, env = "TALLY_SERVER_URL", global = true)]
    pub server_url: Option<String>,

    /// Project the submitted jobs belong to
    #[arg(long, env = "TALLY_PROJECT_ID", global = true)]
    pub project_id: Option<String>,

    /// Rows processed between progress reports
    #[arg(long, env = "TALLY_CHUNK_SIZE", global = true)]
    pub chunk_size: Option<usize>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse and validate a transaction file
    Parse {
        /// Delimited file with a header row
        file: PathBuf,

        /// Print the full result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Parse a file and submit its valid transactions as a batch job
    Submit {
        /// Delimited file with a header row
        file: PathBuf,

        /// Processing to run (ocr, entity_resolution, validation, indexing)
        #[arg(short = 't', long = "type")]
        job_type: JobType,

        /// Display name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,

        /// Return right after submitting instead of watching the job
        #[arg(long)]
        no_watch: bool,
    },

    /// Show the runner's current view of a job
    Status {
        /// Job identifier returned by submit
        job_id: String,
    },

    /// Ask the runner to cancel a job
    Cancel {
        /// Job identifier returned by submit
        job_id: String,
    },
}
