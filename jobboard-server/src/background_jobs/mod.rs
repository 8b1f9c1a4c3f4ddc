//! Background job scheduling and execution system.
//!
//! Runs periodic and hook-triggered tasks, currently the job feed sync, off
//! the request-serving path.

mod context;
mod job;
pub mod jobs;
mod scheduler;

pub use context::JobContext;
pub use job::{BackgroundJob, HookEvent, JobError, JobSchedule};
pub use scheduler::JobScheduler;
