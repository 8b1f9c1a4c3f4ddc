//! Runs a single job feed sync against the configured jobs database.

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jobboard_server::config::{AppConfig, CliConfig, FileConfig};
use jobboard_server::job_feed::JobFeedSync;
use jobboard_server::{JobStore, SqliteJobStore};

#[derive(Parser, Debug)]
#[command(name = "cli-sync")]
#[command(about = "Fetch one batch from the job feed and store it")]
struct CliArgs {
    /// Path to a TOML config file. Values in it override the command line.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Directory holding jobs.db.
    #[clap(long)]
    pub db_dir: Option<PathBuf>,

    /// Application id for the job search API.
    #[clap(long, env = "JOB_FEED_APP_ID")]
    pub job_feed_app_id: Option<String>,

    /// Application key for the job search API.
    #[clap(long, env = "JOB_FEED_APP_KEY", hide_env_values = true)]
    pub job_feed_app_key: Option<String>,

    /// Base URL of the job search API.
    #[clap(long)]
    pub job_feed_base_url: Option<String>,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
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
    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        // Not used here, keeps resolve from generating a secret.
        jwt_secret: Some("unused".to_string()),
        job_feed_app_id: cli_args.job_feed_app_id,
        job_feed_app_key: cli_args.job_feed_app_key,
        job_feed_base_url: cli_args.job_feed_base_url,
        ..CliConfig::default()
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;
    if !config.job_feed.enabled {
        bail!("Job feed credentials are not configured (JOB_FEED_APP_ID / JOB_FEED_APP_KEY)");
    }

    let job_store: Arc<dyn JobStore> = Arc::new(SqliteJobStore::new(config.jobs_db_path())?);
    let sync = JobFeedSync::from_settings(&config.job_feed, job_store.clone())?;

    let report = sync.run(&CancellationToken::new())?;
    println!("Job feed sync done: {}", report);
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.external_id, skipped.reason);
    }
    println!("Jobs in database: {}", job_store.count_jobs()?);
    Ok(())
}
