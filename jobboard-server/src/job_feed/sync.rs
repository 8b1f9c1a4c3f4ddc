use super::client::{AdzunaClient, FeedCredentials, FeedQuery, JobFeed};
use super::identifier::resolve_job_id;
use super::normalizer::normalize_record;
use crate::config::JobFeedSettings;
use crate::job_store::{JobStore, JobUpsert};
use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("job source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("failed to persist jobs: {0:#}")]
    Persistence(anyhow::Error),

    #[error("a job feed sync is already running")]
    AlreadyRunning,

    #[error("job feed sync was cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub external_id: String,
    pub reason: String,
}

/// Outcome of a successful sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub fetched: usize,
    pub upserted: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "fetched {}, upserted {}, skipped {}",
            self.fetched,
            self.upserted,
            self.skipped.len()
        )
    }
}

/// Fetch, normalize and persist one batch from the job feed.
pub struct JobFeedSync {
    feed: Arc<dyn JobFeed>,
    store: Arc<dyn JobStore>,
    query: FeedQuery,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the run ends, whichever way it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl JobFeedSync {
    pub fn new(feed: Arc<dyn JobFeed>, store: Arc<dyn JobStore>, query: FeedQuery) -> Self {
        Self {
            feed,
            store,
            query,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Builds a sync against the Adzuna API described by `settings`.
    /// Creates a blocking HTTP client, so call it off the async runtime.
    pub fn from_settings(
        settings: &JobFeedSettings,
        store: Arc<dyn JobStore>,
    ) -> anyhow::Result<Self> {
        let client = AdzunaClient::new(
            &settings.base_url,
            &settings.country,
            FeedCredentials {
                app_id: settings.app_id.clone(),
                app_key: settings.app_key.clone(),
            },
            settings.timeout,
        )?;
        let query = FeedQuery::new(settings.query.clone(), settings.results_per_page);
        Ok(Self::new(Arc::new(client), store, query))
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn run(&self, cancel: &CancellationToken) -> Result<SyncReport, SyncError> {
        self.run_at(cancel, Utc::now().naive_utc())
    }

    /// Same as [`run`](Self::run) with an explicit write timestamp.
    pub fn run_at(
        &self,
        cancel: &CancellationToken,
        now: NaiveDateTime,
    ) -> Result<SyncReport, SyncError> {
        let _guard = match InFlightGuard::acquire(&self.in_flight) {
            Some(guard) => guard,
            None => {
                warn!("Job feed sync requested while another run is in flight");
                return Err(SyncError::AlreadyRunning);
            }
        };

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        info!(
            "Starting job feed sync (query: {:?}, results per page: {})",
            self.query.keyword, self.query.results_per_page
        );

        let batch = self.feed.fetch(&self.query).map_err(|e| {
            error!("Job feed fetch failed: {}", e);
            e
        })?;
        info!("Fetched {} records from job feed", batch.count);

        let mut report = SyncReport {
            fetched: batch.count,
            ..Default::default()
        };
        let mut upserts = Vec::with_capacity(batch.records.len());

        for record in &batch.records {
            match normalize_record(record) {
                Ok(posting) => upserts.push(JobUpsert {
                    id: resolve_job_id(record.field("id")),
                    posting,
                }),
                Err(e) => {
                    let external_id = record.external_id();
                    warn!("Skipping job feed record {:?}: {}", external_id, e);
                    report.skipped.push(SkippedRecord {
                        external_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if cancel.is_cancelled() {
            info!("Job feed sync cancelled before writing");
            return Err(SyncError::Cancelled);
        }

        if !upserts.is_empty() {
            report.upserted = self.store.upsert_jobs(&upserts, now).map_err(|e| {
                error!("Failed to persist job feed batch: {:#}", e);
                SyncError::Persistence(e)
            })?;
        }

        info!("Job feed sync finished: {}", report);
        Ok(report)
    }
}
