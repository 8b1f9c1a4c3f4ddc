use super::models::{JobRecord, JobUpsert};
use anyhow::Result;
use chrono::NaiveDateTime;
use uuid::Uuid;

pub trait JobStore: Send + Sync {
    /// Inserts or updates every job in a single transaction, keyed by id.
    /// Every column except the id is overwritten on conflict, with both
    /// timestamps set to `now`. Nothing is written if any row fails.
    /// Returns the number of distinct jobs written; repeated ids count once.
    fn upsert_jobs(&self, jobs: &[JobUpsert], now: NaiveDateTime) -> Result<usize>;

    /// Returns a page of jobs, most recently posted first.
    fn list_jobs(&self, offset: usize, limit: usize) -> Result<Vec<JobRecord>>;

    fn count_jobs(&self) -> Result<usize>;

    /// Returns Ok(None) if no job has the given id.
    fn get_job(&self, id: &Uuid) -> Result<Option<JobRecord>>;

    /// Round-trips a trivial query, used by the health check.
    fn ping(&self) -> Result<()>;
}
