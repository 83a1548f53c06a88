//! End-to-end tests for the tally binary
//!
//! Files come from temp dirs; the job runner is a wiremock server.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

const MIXED: &str = "date,description,amount\n2024-01-01,Coffee,4.50\n2024-01-02,\"Rent, March\",\"$1,200.00\"\n2024-01-03,Refund,N/A\n";

/// Helper to write a transaction file into `dir`
fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let file = dir.path().join(name);
    fs::write(&file, content).expect("Failed to write test file");
    file
}

/// The binary with colors off and no inherited tally settings
fn tally() -> Command {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.env("NO_COLOR", "1")
        .env_remove("TALLY_SERVER_URL")
        .env_remove("TALLY_PROJECT_ID")
        .env_remove("TALLY_CHUNK_SIZE");
    cmd
}

#[test]
fn test_parse_prints_summary_and_row_errors() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "march.csv", MIXED);

    tally()
        .arg("parse")
        .arg(&file)
        .arg("--chunk-size")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rows:     3"))
        .stdout(predicate::str::contains("Valid:    2"))
        .stdout(predicate::str::contains("Invalid:  1"))
        .stdout(predicate::str::contains("row 4: Invalid amount: N/A"));
}

#[test]
fn test_parse_json_output() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "march.csv", MIXED);

    let output = tally().arg("parse").arg(&file).arg("--json").output().unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["stats"]["totalRows"], 3);
    assert_eq!(result["stats"]["validRows"], 2);
    assert_eq!(result["transactions"][1]["description"], "Rent, March");
    assert_eq!(result["transactions"][1]["amount"], 1200.0);
    assert_eq!(result["transactions"][0]["_rowNumber"], 2);
    assert_eq!(result["errors"][0]["row"], 4);
}

#[test]
fn test_parse_header_only_file_fails() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "empty.csv", "date,description,amount\n");

    tally()
        .arg("parse")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No data found"));
}

#[test]
fn test_parse_missing_file_fails() {
    let dir = TempDir::new().unwrap();

    tally()
        .arg("parse")
        .arg(dir.path().join("nope.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.csv"));
}

#[test]
fn test_invalid_chunk_size_env_is_config_error() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "march.csv", MIXED);

    Command::cargo_bin("tally")
        .unwrap()
        .env("TALLY_CHUNK_SIZE", "lots")
        .arg("parse")
        .arg(&file)
        .assert()
        .failure();
}

#[tokio::test]
async fn test_submit_without_watch() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "march.csv", MIXED);

    Mock::given(method("POST"))
        .and(path("/batch-jobs/submit"))
        .and(body_partial_json(json!({
            "data_type": "validation",
            "project_id": "acme"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "job-42"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    tally()
        .arg("submit")
        .arg(&file)
        .arg("--type")
        .arg("validation")
        .arg("--no-watch")
        .arg("--project-id")
        .arg("acme")
        .arg("--server-url")
        .arg(mock_server.uri())
        .assert()
        .success()
        .stdout(predicate::str::contains("Submitted job job-42 (2 transactions, type validation)"))
        .stdout(predicate::str::contains("1 invalid rows will not be submitted"));
}

#[tokio::test]
async fn test_submit_watches_until_completed() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "march.csv", MIXED);

    Mock::given(method("POST"))
        .and(path("/batch-jobs/submit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "job-7"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/batch-jobs/job-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "job-7",
            "status": "completed",
            "progress_percent": 100.0,
            "items_processed": 2,
            "total_items": 2,
            "success_rate": 1.0
        })))
        .mount(&mock_server)
        .await;

    tally()
        .arg("submit")
        .arg(&file)
        .arg("--type")
        .arg("indexing")
        .arg("--server-url")
        .arg(mock_server.uri())
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed job job-7"))
        .stdout(predicate::str::contains("Success rate: 100.0%"));
}

#[tokio::test]
async fn test_submit_reports_failed_job() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "march.csv", MIXED);

    Mock::given(method("POST"))
        .and(path("/batch-jobs/submit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "job-8"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/batch-jobs/job-8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "failed",
            "error_message": "schema mismatch"
        })))
        .mount(&mock_server)
        .await;

    tally()
        .arg("submit")
        .arg(&file)
        .arg("--type")
        .arg("ocr")
        .arg("--server-url")
        .arg(mock_server.uri())
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Job job-8 failed: schema mismatch"));
}

#[tokio::test]
async fn test_submit_without_valid_rows_sends_nothing() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir, "bad.csv", "date,description,amount\n2024-01-01,Coffee,abc\n");

    Mock::given(method("POST"))
        .and(path("/batch-jobs/submit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "never"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    tally()
        .arg("submit")
        .arg(&file)
        .arg("--type")
        .arg("validation")
        .arg("--server-url")
        .arg(mock_server.uri())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to submit"));
}

#[tokio::test]
async fn test_status_prints_runner_view() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/batch-jobs/job-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "job-3",
            "status": "processing",
            "progress_percent": 42.5,
            "items_processed": 17,
            "total_items": 40,
            "batches_completed": 1,
            "total_batches": 4
        })))
        .mount(&mock_server)
        .await;

    tally()
        .arg("status")
        .arg("job-3")
        .arg("--server-url")
        .arg(mock_server.uri())
        .assert()
        .success()
        .stdout(predicate::str::contains("Status:    processing"))
        .stdout(predicate::str::contains("Progress:  42.5%"))
        .stdout(predicate::str::contains("Items:     17/40"))
        .stdout(predicate::str::contains("Batches:   1/4"));
}

#[tokio::test]
async fn test_status_unknown_job_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/batch-jobs/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_string("job not found"))
        .mount(&mock_server)
        .await;

    tally()
        .arg("status")
        .arg("ghost")
        .arg("--server-url")
        .arg(mock_server.uri())
        .assert()
        .failure()
        .stderr(predicate::str::contains("job not found"));
}

#[tokio::test]
async fn test_cancel_success_and_refusal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/batch-jobs/job-1/cancel"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/batch-jobs/job-2/cancel"))
        .respond_with(ResponseTemplate::new(409).set_body_string("job already finished"))
        .mount(&mock_server)
        .await;

    tally()
        .arg("cancel")
        .arg("job-1")
        .arg("--server-url")
        .arg(mock_server.uri())
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancellation requested for job job-1"));

    tally()
        .arg("cancel")
        .arg("job-2")
        .arg("--server-url")
        .arg(mock_server.uri())
        .assert()
        .failure()
        .stderr(predicate::str::contains("job already finished"));
}
