use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

/// Content of a job posting, as produced by the feed normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPosting {
    pub title: String,
    pub description: String,
    pub location: String,
    pub employment_type: String,
    pub company: String,
    pub source_url: String,
    pub salary: i64,
    /// Naive UTC.
    pub posted_at: NaiveDateTime,
}

/// A posting ready to be written, keyed by its resolved identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobUpsert {
    pub id: Uuid,
    pub posting: JobPosting,
}

/// A persisted job row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub posting: JobPosting,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
