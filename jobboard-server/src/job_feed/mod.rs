//! Ingestion of job postings from the external job-search API.
//!
//! A sync run fetches one batch of raw records, normalizes each one into a
//! [`JobPosting`](crate::job_store::JobPosting), resolves its identifier and
//! writes the valid subset to the [`JobStore`](crate::job_store::JobStore)
//! in a single transaction.

mod client;
mod identifier;
mod normalizer;
mod sync;

pub use client::{AdzunaClient, FeedCredentials, FeedQuery, JobFeed, RawJobBatch, RawJobRecord};
#[cfg(feature = "mock")]
pub use client::MockJobFeed;
pub use identifier::resolve_job_id;
pub use normalizer::{normalize_record, NormalizeError, MAX_DESCRIPTION_CHARS};
pub use sync::{JobFeedSync, SkippedRecord, SyncError, SyncReport};
