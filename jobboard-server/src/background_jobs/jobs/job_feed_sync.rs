//! Periodic refresh of the jobs table from the external job feed.

use crate::background_jobs::{
    context::JobContext,
    job::{BackgroundJob, HookEvent, JobError, JobSchedule},
};
use crate::job_feed::{JobFeedSync, SyncError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct JobFeedSyncJob {
    sync: Arc<JobFeedSync>,
    interval: Duration,
    run_on_startup: bool,
}

impl JobFeedSyncJob {
    pub fn new(sync: Arc<JobFeedSync>, interval: Duration, run_on_startup: bool) -> Self {
        Self {
            sync,
            interval,
            run_on_startup,
        }
    }
}

impl BackgroundJob for JobFeedSyncJob {
    fn id(&self) -> &'static str {
        "job_feed_sync"
    }

    fn name(&self) -> &'static str {
        "Job Feed Sync"
    }

    fn description(&self) -> &'static str {
        "Fetch postings from the job-search API and upsert them into the jobs table"
    }

    fn schedule(&self) -> JobSchedule {
        if self.run_on_startup {
            JobSchedule::Combined {
                interval: Some(self.interval),
                hooks: vec![HookEvent::OnStartup],
            }
        } else {
            JobSchedule::Interval(self.interval)
        }
    }

    fn execute(&self, ctx: &JobContext) -> Result<(), JobError> {
        let report = self.sync.run(&ctx.cancellation_token).map_err(|e| match e {
            SyncError::AlreadyRunning => JobError::AlreadyRunning,
            SyncError::Cancelled => JobError::Cancelled,
            other => JobError::ExecutionFailed(other.to_string()),
        })?;

        match ctx.job_store.count_jobs() {
            Ok(total) => info!(
                "Job feed sync upserted {} postings, {} stored in total",
                report.upserted, total
            ),
            Err(e) => warn!("Failed to count stored jobs after sync: {}", e),
        }

        Ok(())
    }
}
