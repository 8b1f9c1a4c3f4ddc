use super::context::JobContext;
use super::job::{BackgroundJob, HookEvent, JobError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Upper bound on how long the loop sleeps without re-checking schedules.
const MAX_IDLE: Duration = Duration::from_secs(60);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Manages background job scheduling and execution.
pub struct JobScheduler {
    jobs: HashMap<String, Arc<dyn BackgroundJob>>,

    /// When each interval-driven job is next due.
    next_runs: HashMap<String, Instant>,

    /// Ids of jobs currently executing, cleared by the job task itself.
    running_jobs: Arc<RwLock<HashSet<String>>>,

    running_handles: HashMap<String, JoinHandle<()>>,

    job_cancel_tokens: HashMap<String, CancellationToken>,

    shutdown_token: CancellationToken,

    job_context: JobContext,
}

impl JobScheduler {
    pub fn new(shutdown_token: CancellationToken, job_context: JobContext) -> Self {
        Self {
            jobs: HashMap::new(),
            next_runs: HashMap::new(),
            running_jobs: Arc::new(RwLock::new(HashSet::new())),
            running_handles: HashMap::new(),
            job_cancel_tokens: HashMap::new(),
            shutdown_token,
            job_context,
        }
    }

    /// Register a job. Interval-driven jobs first become due one interval
    /// from now.
    pub fn register_job(&mut self, job: Arc<dyn BackgroundJob>) {
        let job_id = job.id().to_string();
        info!("Registering job: {} - {}", job_id, job.description());
        if let Some(interval) = job.schedule().interval() {
            self.next_runs.insert(job_id.clone(), Instant::now() + interval);
        }
        self.jobs.insert(job_id, job);
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub async fn is_job_running(&self, job_id: &str) -> bool {
        self.running_jobs.read().await.contains(job_id)
    }

    /// Main scheduler loop, returns once the shutdown token is cancelled and
    /// running jobs have wound down.
    pub async fn run(&mut self) {
        info!("Starting job scheduler with {} registered jobs", self.job_count());

        self.trigger_jobs_for_hook(HookEvent::OnStartup).await;

        loop {
            self.cleanup_completed_jobs().await;

            let sleep_duration = self.time_until_next_scheduled_job();
            debug!(
                "Scheduler sleeping for {:?} until next scheduled job",
                sleep_duration
            );

            tokio::select! {
                _ = tokio::time::sleep(sleep_duration) => {
                    self.run_due_jobs().await;
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Scheduler received shutdown signal");
                    self.shutdown().await;
                    break;
                }
            }
        }

        info!("Job scheduler stopped");
    }

    fn time_until_next_scheduled_job(&self) -> Duration {
        let now = Instant::now();
        self.next_runs
            .values()
            .map(|due| due.saturating_duration_since(now))
            .min()
            .map_or(MAX_IDLE, |until| until.min(MAX_IDLE))
    }

    async fn run_due_jobs(&mut self) {
        let now = Instant::now();
        let due: Vec<String> = self
            .next_runs
            .iter()
            .filter(|(_, due)| **due <= now)
            .map(|(job_id, _)| job_id.clone())
            .collect();

        for job_id in due {
            if let Some(interval) = self.jobs.get(&job_id).and_then(|j| j.schedule().interval()) {
                self.next_runs.insert(job_id.clone(), now + interval);
            }

            if self.running_jobs.read().await.contains(&job_id) {
                warn!(
                    "Skipping scheduled run of {}: previous run still in progress",
                    job_id
                );
                continue;
            }
            self.spawn_job(&job_id, "schedule").await;
        }
    }

    async fn trigger_jobs_for_hook(&mut self, event: HookEvent) {
        let mut jobs_to_trigger = Vec::new();
        for (job_id, job) in &self.jobs {
            if !job.schedule().listens_to(event) {
                continue;
            }
            if self.running_jobs.read().await.contains(job_id) {
                debug!("Skipping hook trigger for already running job: {}", job_id);
                continue;
            }
            jobs_to_trigger.push(job_id.clone());
        }

        for job_id in jobs_to_trigger {
            let trigger = format!("hook:{}", event);
            self.spawn_job(&job_id, &trigger).await;
        }
    }

    async fn spawn_job(&mut self, job_id: &str, triggered_by: &str) {
        let job = match self.jobs.get(job_id) {
            Some(job) => Arc::clone(job),
            None => {
                error!("Attempted to spawn unknown job: {}", job_id);
                return;
            }
        };

        info!("Starting job: {} (triggered_by: {})", job_id, triggered_by);

        self.running_jobs.write().await.insert(job_id.to_string());

        let cancel_token = self.shutdown_token.child_token();
        self.job_cancel_tokens
            .insert(job_id.to_string(), cancel_token.clone());
        let ctx = self.job_context.with_token(cancel_token);

        let job_id_owned = job_id.to_string();
        let running_jobs = Arc::clone(&self.running_jobs);

        let handle = tokio::spawn(async move {
            let start_time = std::time::Instant::now();
            let result = tokio::task::spawn_blocking(move || job.execute(&ctx)).await;
            let elapsed = start_time.elapsed();

            match result {
                Ok(Ok(())) => {
                    info!("Job {} completed successfully in {:?}", job_id_owned, elapsed);
                }
                Ok(Err(JobError::Cancelled)) => {
                    info!("Job {} was cancelled after {:?}", job_id_owned, elapsed);
                }
                Ok(Err(e)) => {
                    error!("Job {} failed after {:?}: {}", job_id_owned, elapsed, e);
                }
                Err(e) => {
                    error!("Job {} panicked after {:?}: {}", job_id_owned, elapsed, e);
                }
            }

            running_jobs.write().await.remove(&job_id_owned);
        });

        self.running_handles.insert(job_id.to_string(), handle);
    }

    async fn cleanup_completed_jobs(&mut self) {
        let completed: Vec<String> = self
            .running_handles
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(job_id, _)| job_id.clone())
            .collect();

        for job_id in completed {
            if let Some(handle) = self.running_handles.remove(&job_id) {
                let _ = handle.await;
            }
            self.job_cancel_tokens.remove(&job_id);
        }
    }

    async fn shutdown(&mut self) {
        info!("Shutting down scheduler...");

        for (job_id, token) in &self.job_cancel_tokens {
            debug!("Cancelling job: {}", job_id);
            token.cancel();
        }

        for (job_id, handle) in self.running_handles.drain() {
            if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
                warn!("Job {} did not stop within {:?}", job_id, SHUTDOWN_GRACE);
            }
        }

        self.job_cancel_tokens.clear();
        info!("Scheduler shutdown complete");
    }
}
