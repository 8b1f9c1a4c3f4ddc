//! Persistence for job postings ingested from the external feed.

mod models;
mod schema;
mod store;
mod trait_def;

pub use models::{JobPosting, JobRecord, JobUpsert};
pub use store::SqliteJobStore;
pub use trait_def::JobStore;
