use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jobboard_server::background_jobs::{jobs::JobFeedSyncJob, JobContext, JobScheduler};
use jobboard_server::config::{AppConfig, CliConfig, FileConfig};
use jobboard_server::job_feed::JobFeedSync;
use jobboard_server::{
    run_server, JobStore, RequestsLoggingLevel, ServerConfig, SqliteJobStore, SqliteUserStore,
    TokenIssuer, UserManager,
};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values in it override the command line.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Directory holding user.db and jobs.db.
    #[clap(long)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8000)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Secret used to sign access tokens. A random one is generated if unset.
    #[clap(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Lifetime of issued access tokens, in minutes.
    #[clap(long, default_value_t = 30)]
    pub access_token_expire_minutes: u64,

    /// Allowed CORS origin, repeatable.
    #[clap(long = "cors-origin")]
    pub cors_origins: Vec<String>,

    /// Application id for the job search API.
    #[clap(long, env = "JOB_FEED_APP_ID")]
    pub job_feed_app_id: Option<String>,

    /// Application key for the job search API.
    #[clap(long, env = "JOB_FEED_APP_KEY", hide_env_values = true)]
    pub job_feed_app_key: Option<String>,

    /// Base URL of the job search API.
    #[clap(long)]
    pub job_feed_base_url: Option<String>,

    /// Interval in hours between job feed syncs.
    #[clap(long, default_value_t = 24)]
    pub sync_interval_hours: u64,

    /// Run a job feed sync as soon as the server starts.
    #[clap(long)]
    pub sync_on_startup: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            jwt_secret: self.jwt_secret.clone(),
            access_token_expire_minutes: self.access_token_expire_minutes,
            cors_origins: self.cors_origins.clone(),
            job_feed_app_id: self.job_feed_app_id.clone(),
            job_feed_app_key: self.job_feed_app_key.clone(),
            job_feed_base_url: self.job_feed_base_url.clone(),
            sync_interval_hours: self.sync_interval_hours,
            sync_on_startup: self.sync_on_startup,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;
    info!("Resolved configuration: {:?}", config);

    info!("Opening user database at {:?}...", config.user_db_path());
    let user_store = Arc::new(SqliteUserStore::new(config.user_db_path())?);
    info!("Opening jobs database at {:?}...", config.jobs_db_path());
    let job_store: Arc<dyn JobStore> = Arc::new(SqliteJobStore::new(config.jobs_db_path())?);

    let tokens = TokenIssuer::new(&config.auth.jwt_secret, config.auth.access_token_expire);
    let user_manager = Arc::new(UserManager::new(user_store, tokens));

    let shutdown_token = CancellationToken::new();

    let scheduler_task = if config.job_feed.enabled {
        let settings = config.job_feed.clone();
        let sync_store = job_store.clone();
        let sync = tokio::task::spawn_blocking(move || {
            JobFeedSync::from_settings(&settings, sync_store)
        })
        .await
        .context("Job feed client setup panicked")??;

        let mut scheduler = JobScheduler::new(
            shutdown_token.child_token(),
            JobContext::new(shutdown_token.child_token(), job_store.clone()),
        );
        scheduler.register_job(Arc::new(JobFeedSyncJob::new(
            Arc::new(sync),
            config.job_feed.interval,
            config.job_feed.sync_on_startup,
        )));
        info!(
            "Job feed sync enabled, every {}h",
            config.job_feed.interval.as_secs() / 3600
        );
        Some(tokio::spawn(async move { scheduler.run().await }))
    } else {
        warn!("Job feed credentials not configured, feed sync disabled");
        None
    };

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
        cors_origins: config.cors_origins.clone(),
    };
    let mut server = tokio::spawn(run_server(
        server_config,
        user_manager,
        job_store,
        shutdown_token.child_token(),
    ));

    let finished_early = tokio::select! {
        result = &mut server => Some(result),
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for Ctrl-C: {}", e);
            }
            info!("Shutting down...");
            None
        }
    };
    shutdown_token.cancel();

    if let Some(task) = scheduler_task {
        if let Err(e) = task.await {
            error!("Scheduler task failed: {}", e);
        }
    }

    let server_result = match finished_early {
        Some(result) => result,
        None => server.await,
    };
    server_result.context("Server task panicked")?
}
