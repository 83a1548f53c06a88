//! Configuration management for Tally CLI
//!
//! Settings come from the environment (and `.env`, loaded in `main`), then
//! command-line flags override them.

use crate::error::Result;
use crate::Cli;
use std::time::Duration;
use tally_common::env;
use tally_ingest::{ParseOptions, DEFAULT_CHUNK_SIZE};
use tally_jobs::client::DEFAULT_API_TIMEOUT_SECS;
use tally_jobs::JobClientConfig;

// ============================================================================
// CLI Configuration Constants
// ============================================================================

/// Default job runner URL when not specified via environment variable.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Project id used when none is configured.
pub const DEFAULT_PROJECT_ID: &str = "default";

/// CLI configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Job runner base URL
    pub server_url: String,

    /// Project attached to submitted jobs
    pub project_id: String,

    /// Rows per progress report
    pub chunk_size: usize,

    /// Per-request timeout for the job runner
    pub api_timeout: Duration,
}

impl Config {
    /// Load config from environment variables
    ///
    /// - `TALLY_SERVER_URL`
    /// - `TALLY_PROJECT_ID`
    /// - `TALLY_CHUNK_SIZE`
    /// - `TALLY_API_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_url: env::string_or("TALLY_SERVER_URL", DEFAULT_SERVER_URL),
            project_id: env::string_or("TALLY_PROJECT_ID", DEFAULT_PROJECT_ID),
            chunk_size: env::var_or("TALLY_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            api_timeout: Duration::from_secs(env::var_or(
                "TALLY_API_TIMEOUT_SECS",
                DEFAULT_API_TIMEOUT_SECS,
            )?),
        })
    }

    /// Apply flags given on the command line.
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(ref url) = cli.server_url {
            self.server_url = url.clone();
        }
        if let Some(ref project_id) = cli.project_id {
            self.project_id = project_id.clone();
        }
        if let Some(chunk_size) = cli.chunk_size {
            self.chunk_size = chunk_size;
        }
        self
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::with_chunk_size(self.chunk_size)
    }

    pub fn job_client_config(&self) -> JobClientConfig {
        JobClientConfig::new(&self.server_url).with_timeout(self.api_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            project_id: DEFAULT_PROJECT_ID.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use clap::Parser;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.project_id, "default");
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.api_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_config_from_env() {
        std::env::set_var("TALLY_SERVER_URL", "http://runner.internal:9000");
        std::env::set_var("TALLY_API_TIMEOUT_SECS", "5");
        std::env::set_var("TALLY_CHUNK_SIZE", "many");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, CliError::Config(_)));

        std::env::set_var("TALLY_CHUNK_SIZE", "250");
        let config = Config::from_env().unwrap();
        assert_eq!(config.server_url, "http://runner.internal:9000");
        assert_eq!(config.chunk_size, 250);
        assert_eq!(config.api_timeout, Duration::from_secs(5));

        std::env::remove_var("TALLY_SERVER_URL");
        std::env::remove_var("TALLY_API_TIMEOUT_SECS");
        std::env::remove_var("TALLY_CHUNK_SIZE");
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "tally",
            "--server-url",
            "http://flag:1",
            "--chunk-size",
            "10",
            "status",
            "job-1",
        ])
        .unwrap();

        let config = Config::default().with_cli(&cli);
        assert_eq!(config.server_url, "http://flag:1");
        assert_eq!(config.chunk_size, 10);
        assert_eq!(config.project_id, DEFAULT_PROJECT_ID);
        assert_eq!(config.parse_options().chunk_size, 10);
    }
}
