//! HTTP client for the remote job runner

use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::backend::{JobBackend, JobStatusSource};
use crate::endpoints;
use crate::error::{JobError, Result};
use crate::types::{JobStatusUpdate, SubmitRequest, SubmitResponse};

// ============================================================================
// API Client Constants
// ============================================================================

/// Default timeout for job runner requests in seconds.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`JobApiClient`]
#[derive(Debug, Clone)]
pub struct JobClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl JobClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// reqwest-backed [`JobBackend`]
#[derive(Debug, Clone)]
pub struct JobApiClient {
    client: Client,
    base_url: String,
}

impl JobApiClient {
    pub fn new(config: JobClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Turn a non-success status into [`JobError::Api`] carrying the body text.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body
    };

    Err(JobError::api(status.as_u16(), message))
}

#[async_trait]
impl JobStatusSource for JobApiClient {
    #[instrument(skip(self))]
    async fn fetch_status(&self, job_id: &str) -> Result<JobStatusUpdate> {
        let url = endpoints::job_url(&self.base_url, job_id);

        let response = check(self.client.get(&url).send().await?).await?;
        let update: JobStatusUpdate = response.json().await?;

        debug!(status = ?update.status, progress = ?update.progress_percent, "Fetched job status");
        Ok(update)
    }
}

#[async_trait]
impl JobBackend for JobApiClient {
    #[instrument(skip(self, request), fields(data_type = %request.data_type, items = request.items.len()))]
    async fn submit(&self, request: &SubmitRequest) -> Result<String> {
        let url = endpoints::submit_url(&self.base_url);

        let response = check(self.client.post(&url).json(request).send().await?).await?;
        let submitted: SubmitResponse = response.json().await?;

        Ok(submitted.job_id)
    }

    #[instrument(skip(self))]
    async fn cancel(&self, job_id: &str) -> Result<()> {
        let url = endpoints::cancel_url(&self.base_url, job_id);

        check(self.client.post(&url).send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_creation() {
        let client = JobApiClient::new(JobClientConfig::new("http://localhost:8000")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_unreachable_runner_is_http_error() {
        let config = JobClientConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2));
        let client = JobApiClient::new(config).unwrap();

        let err = client.fetch_status("job-1").await.unwrap_err();
        assert!(matches!(err, JobError::Http(_)));
    }
}
