use super::context::JobContext;
use std::time::Duration;
use thiserror::Error;

/// Schedule for when a job should run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSchedule {
    /// Run at fixed intervals, the first run one interval after registration
    Interval(Duration),
    /// Run only in response to hooks
    Hook(HookEvent),
    /// Interval-driven and also triggered by hooks
    Combined {
        interval: Option<Duration>,
        hooks: Vec<HookEvent>,
    },
}

impl JobSchedule {
    pub fn interval(&self) -> Option<Duration> {
        match self {
            JobSchedule::Interval(interval) => Some(*interval),
            JobSchedule::Combined { interval, .. } => *interval,
            JobSchedule::Hook(_) => None,
        }
    }

    pub fn listens_to(&self, event: HookEvent) -> bool {
        match self {
            JobSchedule::Hook(hook) => *hook == event,
            JobSchedule::Combined { hooks, .. } => hooks.contains(&event),
            JobSchedule::Interval(_) => false,
        }
    }
}

/// Events that can trigger hook-based jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    OnStartup,
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookEvent::OnStartup => write!(f, "OnStartup"),
        }
    }
}

/// Errors that can occur during job execution.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job is already running")]
    AlreadyRunning,
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Job was cancelled")]
    Cancelled,
}

/// Trait for background jobs.
///
/// Jobs are executed synchronously in a blocking context.
pub trait BackgroundJob: Send + Sync {
    /// Unique identifier for this job.
    fn id(&self) -> &'static str;

    /// Human-readable name for this job.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn schedule(&self) -> JobSchedule;

    /// Called from `spawn_blocking`. Long-running work should check
    /// `ctx.is_cancelled()` and return `JobError::Cancelled` when it is set.
    fn execute(&self, ctx: &JobContext) -> Result<(), JobError>;
}
