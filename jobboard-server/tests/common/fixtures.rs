//! Test fixtures: seeded jobs and a stand-in for the upstream job search API

use super::constants::*;
use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use jobboard_server::config::JobFeedSettings;
use jobboard_server::job_store::{JobPosting, JobStore, JobUpsert};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use uuid::Uuid;

fn posting(title: &str, company: &str, day: u32) -> JobPosting {
    JobPosting {
        title: title.to_string(),
        description: format!("{} wanted at {}", title, company),
        location: "Bengaluru".to_string(),
        employment_type: "full_time".to_string(),
        company: company.to_string(),
        source_url: format!("https://jobs.example.com/{}", day),
        salary: 100_000 + day as i64,
        posted_at: NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap(),
    }
}

/// Writes three jobs, JOB_1 posted most recently and JOB_3 first.
pub fn seed_jobs(store: &dyn JobStore) -> anyhow::Result<()> {
    let now = NaiveDate::from_ymd_opt(2024, 3, 20)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let jobs = vec![
        JobUpsert {
            id: Uuid::parse_str(JOB_1_ID)?,
            posting: posting(JOB_1_TITLE, "Ferris Labs", 15),
        },
        JobUpsert {
            id: Uuid::parse_str(JOB_2_ID)?,
            posting: posting(JOB_2_TITLE, "Crab Corp", 10),
        },
        JobUpsert {
            id: Uuid::parse_str(JOB_3_ID)?,
            posting: posting(JOB_3_TITLE, "Tokio Inc", 5),
        },
    ];
    store.upsert_jobs(&jobs, now)?;
    Ok(())
}

#[derive(Clone)]
struct UpstreamState {
    status: StatusCode,
    body: Value,
    requests: Arc<Mutex<Vec<String>>>,
}

async fn search(
    State(upstream): State<UpstreamState>,
    Path((country, page)): Path<(String, u32)>,
    RawQuery(query): RawQuery,
) -> Response {
    upstream.requests.lock().unwrap().push(format!(
        "/{}/search/{}?{}",
        country,
        page,
        query.unwrap_or_default()
    ));
    (upstream.status, Json(upstream.body.clone())).into_response()
}

/// Mock job search API answering every search with a fixed status and body.
pub struct FeedUpstream {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FeedUpstream {
    /// Path and query of every request received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for FeedUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn spawn_feed_upstream(status: StatusCode, body: Value) -> FeedUpstream {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = UpstreamState {
        status,
        body,
        requests: requests.clone(),
    };
    let app = Router::new()
        .route("/{country}/search/{page}", get(search))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind upstream port");
    let port = listener.local_addr().unwrap().port();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Upstream server failed");
    });

    FeedUpstream {
        base_url: format!("http://127.0.0.1:{}", port),
        requests,
        _shutdown_tx: Some(shutdown_tx),
    }
}

/// Feed settings pointing at a mock upstream.
pub fn feed_settings(base_url: &str) -> JobFeedSettings {
    JobFeedSettings {
        enabled: true,
        app_id: "test-app".to_string(),
        app_key: "test-key".to_string(),
        base_url: base_url.to_string(),
        country: "in".to_string(),
        query: "rust developer".to_string(),
        results_per_page: 50,
        timeout: Duration::from_secs(5),
        interval: Duration::from_secs(24 * 60 * 60),
        sync_on_startup: false,
    }
}
