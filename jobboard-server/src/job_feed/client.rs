//! HTTP client for the Adzuna job-search API.

use super::sync::SyncError;
use anyhow::Result;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Search parameters for a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub keyword: String,
    pub results_per_page: u32,
    pub page: u32,
}

impl FeedQuery {
    pub fn new(keyword: impl Into<String>, results_per_page: u32) -> Self {
        Self {
            keyword: keyword.into(),
            results_per_page,
            page: 1,
        }
    }
}

#[derive(Clone)]
pub struct FeedCredentials {
    pub app_id: String,
    pub app_key: String,
}

impl std::fmt::Debug for FeedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedCredentials")
            .field("app_id", &self.app_id)
            .field("app_key", &"<redacted>")
            .finish()
    }
}

/// One loosely-structured record as returned by the feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawJobRecord(pub Map<String, Value>);

impl RawJobRecord {
    /// Top-level field, `None` if absent.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// `outer.inner`, `None` if either level is absent or `outer` is not an object.
    pub fn nested_field(&self, outer: &str, inner: &str) -> Option<&Value> {
        self.0.get(outer)?.as_object()?.get(inner)
    }

    /// The external id rendered as a string, for logging.
    pub fn external_id(&self) -> String {
        match self.field("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

impl From<Map<String, Value>> for RawJobRecord {
    fn from(map: Map<String, Value>) -> Self {
        RawJobRecord(map)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawJobBatch {
    pub records: Vec<RawJobRecord>,
    pub count: usize,
}

impl RawJobBatch {
    pub fn new(records: Vec<RawJobRecord>) -> Self {
        let count = records.len();
        Self { records, count }
    }
}

/// Source of raw job records.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait JobFeed: Send + Sync {
    /// Fetches one batch. Any transport, status or decode failure is reported
    /// as [`SyncError::SourceUnavailable`].
    fn fetch(&self, query: &FeedQuery) -> Result<RawJobBatch, SyncError>;
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Option<Vec<Value>>,
}

pub struct AdzunaClient {
    client: Client,
    base_url: String,
    country: String,
    credentials: FeedCredentials,
}

impl AdzunaClient {
    pub fn new(
        base_url: &str,
        country: &str,
        credentials: FeedCredentials,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            country: country.to_string(),
            credentials,
        })
    }

    fn search_url(&self, page: u32) -> String {
        format!("{}/{}/search/{}", self.base_url, self.country, page)
    }
}

impl JobFeed for AdzunaClient {
    fn fetch(&self, query: &FeedQuery) -> Result<RawJobBatch, SyncError> {
        let url = self.search_url(query.page);
        debug!("Fetching job feed from {}", url);

        let results_per_page = query.results_per_page.to_string();
        // Errors are stripped of their URL since the query string carries the app key.
        let response = self
            .client
            .get(&url)
            .query(&[
                ("app_id", self.credentials.app_id.as_str()),
                ("app_key", self.credentials.app_key.as_str()),
                ("what", query.keyword.as_str()),
                ("results_per_page", results_per_page.as_str()),
            ])
            .send()
            .map_err(|e| {
                SyncError::SourceUnavailable(format!("request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::SourceUnavailable(format!(
                "job feed responded with status {}",
                status
            )));
        }

        let body: SearchResponse = response.json().map_err(|e| {
            SyncError::SourceUnavailable(format!("malformed response body: {}", e.without_url()))
        })?;

        let mut records = Vec::new();
        for value in body.results.unwrap_or_default() {
            match value {
                Value::Object(map) => records.push(RawJobRecord(map)),
                other => warn!("Ignoring non-object entry in job feed results: {}", other),
            }
        }

        Ok(RawJobBatch::new(records))
    }
}
