use crate::job_store::JobStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Context provided to jobs during execution.
#[derive(Clone)]
pub struct JobContext {
    /// Token to check for cancellation/shutdown requests.
    pub cancellation_token: CancellationToken,

    pub job_store: Arc<dyn JobStore>,
}

impl JobContext {
    pub fn new(cancellation_token: CancellationToken, job_store: Arc<dyn JobStore>) -> Self {
        Self {
            cancellation_token,
            job_store,
        }
    }

    /// Same resources, different cancellation token.
    pub fn with_token(&self, cancellation_token: CancellationToken) -> Self {
        Self {
            cancellation_token,
            job_store: Arc::clone(&self.job_store),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}
