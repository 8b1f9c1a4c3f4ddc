use axum::extract::FromRef;

use crate::job_store::JobStore;
use crate::user::UserManager;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedUserManager = Arc<UserManager>;
pub type GuardedJobStore = Arc<dyn JobStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub user_manager: GuardedUserManager,
    pub job_store: GuardedJobStore,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        user_manager: GuardedUserManager,
        job_store: GuardedJobStore,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            user_manager,
            job_store,
        }
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedJobStore {
    fn from_ref(input: &ServerState) -> Self {
        input.job_store.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
