//! Job runner endpoint URL builders

/// Build job submission URL
pub fn submit_url(base_url: &str) -> String {
    format!("{}/batch-jobs/submit", base_url.trim_end_matches('/'))
}

/// Build job status URL
pub fn job_url(base_url: &str, job_id: &str) -> String {
    format!("{}/batch-jobs/{}", base_url.trim_end_matches('/'), job_id)
}

/// Build job cancellation URL
pub fn cancel_url(base_url: &str, job_id: &str) -> String {
    format!("{}/cancel", job_url(base_url, job_id))
}
