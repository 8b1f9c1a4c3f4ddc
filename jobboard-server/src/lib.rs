//! Job Board Server Library
//!
//! This library exposes the internal modules for the binaries and the
//! integration tests.

pub mod background_jobs;
pub mod config;
pub mod job_feed;
pub mod job_store;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use job_store::{JobStore, SqliteJobStore};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use user::{SqliteUserStore, TokenIssuer, UserManager, UserStore};
