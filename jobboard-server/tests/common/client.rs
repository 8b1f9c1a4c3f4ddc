//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint and keeps the bearer
//! token obtained at login. When API routes or request formats change,
//! update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client with bearer token management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    /// Sent as `Authorization: Bearer` when set
    pub token: Option<String>,
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            token: None,
        }
    }

    /// Creates a client logged in as the seeded test user
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        let mut client = Self::new(base_url);

        let response = client.login(TEST_USER_EMAIL, TEST_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Test user authentication failed"
        );
        let body: Value = response.json().await.expect("Login body is not JSON");
        client.token = body["data"]["access_token"].as_str().map(str::to_string);
        assert!(client.token.is_some(), "Login returned no token: {}", body);

        client
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // ========================================================================
    // Service Endpoints
    // ========================================================================

    pub async fn home(&self) -> Response {
        self.get("/").send().await.expect("Home request failed")
    }

    pub async fn health(&self) -> Response {
        self.get("/health").send().await.expect("Health request failed")
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /auth/register with an arbitrary JSON body
    pub async fn register_raw(&self, body: Value) -> Response {
        self.client
            .post(format!("{}/auth/register", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Register request failed")
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Response {
        self.register_raw(json!({
            "name": name,
            "email": email,
            "password": password,
        }))
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/auth/login", self.base_url))
            .json(&json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    pub async fn me(&self) -> Response {
        self.get("/auth/me").send().await.expect("Me request failed")
    }

    // ========================================================================
    // Job Endpoints
    // ========================================================================

    pub async fn list_jobs(&self) -> Response {
        self.get("/jobs").send().await.expect("List jobs request failed")
    }

    pub async fn list_jobs_page(&self, page: usize, limit: usize) -> Response {
        self.get(&format!("/jobs?page={}&limit={}", page, limit))
            .send()
            .await
            .expect("List jobs request failed")
    }

    pub async fn get_job(&self, job_id: &str) -> Response {
        self.get(&format!("/jobs/{}", job_id))
            .send()
            .await
            .expect("Get job request failed")
    }
}
