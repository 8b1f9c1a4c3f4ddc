//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own databases, one registered
//! user and three seeded jobs.

use super::constants::*;
use super::fixtures::seed_jobs;
use jobboard_server::job_store::{JobStore, SqliteJobStore};
use jobboard_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use jobboard_server::user::{Registration, SqliteUserStore, TokenIssuer, UserManager};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated databases
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// Job store shared with the server, for direct access in tests
    pub job_store: Arc<dyn JobStore>,

    /// Issues tokens accepted by the server
    pub tokens: TokenIssuer,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if database setup, port binding or startup fails.
    pub async fn spawn() -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");

        let user_store = Arc::new(
            SqliteUserStore::new(temp_db_dir.path().join("user.db"))
                .expect("Failed to open user store"),
        );
        let job_store: Arc<dyn JobStore> = Arc::new(
            SqliteJobStore::new(temp_db_dir.path().join("jobs.db"))
                .expect("Failed to open job store"),
        );
        seed_jobs(job_store.as_ref()).expect("Failed to seed jobs");

        let tokens = TokenIssuer::new(TEST_JWT_SECRET, Duration::from_secs(30 * 60));
        let user_manager = Arc::new(UserManager::new(user_store, tokens.clone()));
        user_manager
            .register(Registration {
                name: TEST_USER_NAME.to_string(),
                email: TEST_USER_EMAIL.to_string(),
                password: TEST_PASS.to_string(),
                profile_info: None,
            })
            .expect("Failed to register test user");

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            cors_origins: vec!["http://localhost:3000".to_string()],
        };
        let app = make_app(config, user_manager, job_store.clone()).expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            job_store,
            tokens,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the / endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
