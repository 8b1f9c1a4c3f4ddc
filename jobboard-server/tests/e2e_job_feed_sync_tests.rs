//! End-to-end tests for the job feed sync against a mock upstream API
//!
//! The sync writes into the same store the test server reads from, so the
//! results are checked through the HTTP API.

mod common;

use common::{
    feed_settings, spawn_feed_upstream, FeedUpstream, TestClient, TestServer, SEEDED_JOBS_COUNT,
};
use jobboard_server::job_feed::{resolve_job_id, JobFeedSync, SyncError, SyncReport};
use jobboard_server::job_store::JobStore;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn upstream_body() -> Value {
    json!({
        "count": 3,
        "results": [
            {
                "id": "4001",
                "title": "Rust Platform Engineer",
                "description": "Own the ingestion pipeline",
                "location": {"display_name": "Pune"},
                "company": {"display_name": "Oxide Widgets"},
                "contract_time": "contract",
                "redirect_url": "https://jobs.example.com/4001",
                "salary_min": 90000,
                "salary_max": 150000,
                "created": "2024-04-01T08:30:00Z"
            },
            {
                "id": 4002,
                "title": "Junior Developer",
                "created": "2024-03-30"
            },
            {
                "id": "4003",
                "title": "Broken Timestamp",
                "created": "yesterday-ish"
            }
        ]
    })
}

/// Runs one sync off the async runtime, the blocking HTTP client needs it.
async fn run_sync(upstream: &FeedUpstream, store: Arc<dyn JobStore>) -> Result<SyncReport, SyncError> {
    let settings = feed_settings(&upstream.base_url);
    tokio::task::spawn_blocking(move || {
        let sync = JobFeedSync::from_settings(&settings, store).unwrap();
        sync.run(&CancellationToken::new())
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_sync_stores_valid_records() {
    let server = TestServer::spawn().await;
    let upstream = spawn_feed_upstream(StatusCode::OK, upstream_body()).await;

    let report = run_sync(&upstream, server.job_store.clone()).await.unwrap();
    assert_eq!(report.fetched, 3);
    assert_eq!(report.upserted, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].external_id, "4003");

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("/in/search/1?"));
    assert!(requests[0].contains("app_id=test-app"));
    assert!(requests[0].contains("app_key=test-key"));
    assert!(requests[0].contains("results_per_page=50"));

    let client = TestClient::authenticated(server.base_url.clone()).await;
    let body: Value = client.list_jobs().await.json().await.unwrap();
    assert_eq!(body["meta"]["total"], json!(SEEDED_JOBS_COUNT + 2));
    // Newest posting first
    assert_eq!(body["data"][0]["title"], json!("Rust Platform Engineer"));

    let id = resolve_job_id(Some(&json!("4001")));
    let response = client.get_job(&id.to_string()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let job: Value = response.json().await.unwrap();
    assert_eq!(job["data"]["company"], json!("Oxide Widgets"));
    assert_eq!(job["data"]["location"], json!("Pune"));
    assert_eq!(job["data"]["salary"], json!(150000));
    assert_eq!(job["data"]["posted_at"], json!("2024-04-01T08:30:00"));

    let id = resolve_job_id(Some(&json!(4002)));
    let body: Value = client.get_job(&id.to_string()).await.json().await.unwrap();
    assert_eq!(body["data"]["company"], json!("Unknown Company"));
    assert_eq!(body["data"]["salary"], json!(0));
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let server = TestServer::spawn().await;
    let upstream = spawn_feed_upstream(StatusCode::OK, upstream_body()).await;

    run_sync(&upstream, server.job_store.clone()).await.unwrap();
    run_sync(&upstream, server.job_store.clone()).await.unwrap();

    assert_eq!(server.job_store.count_jobs().unwrap(), SEEDED_JOBS_COUNT + 2);
}

#[tokio::test]
async fn test_sync_upstream_failure_writes_nothing() {
    let server = TestServer::spawn().await;
    let upstream = spawn_feed_upstream(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "upstream exploded"}),
    )
    .await;

    let err = run_sync(&upstream, server.job_store.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::SourceUnavailable(_)));
    assert!(err.to_string().contains("500"));
    // The app key must not leak into errors.
    assert!(!err.to_string().contains("test-key"));

    assert_eq!(server.job_store.count_jobs().unwrap(), SEEDED_JOBS_COUNT);
}

#[tokio::test]
async fn test_sync_with_empty_results() {
    let server = TestServer::spawn().await;
    let upstream = spawn_feed_upstream(StatusCode::OK, json!({"count": 0, "results": []})).await;

    let report = run_sync(&upstream, server.job_store.clone()).await.unwrap();
    assert_eq!(report, SyncReport::default());
    assert_eq!(server.job_store.count_jobs().unwrap(), SEEDED_JOBS_COUNT);
}
