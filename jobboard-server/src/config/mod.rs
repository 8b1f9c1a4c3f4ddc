mod file_config;

pub use file_config::{FileConfig, JobFeedConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use rand::Rng;
use rand_distr::Alphanumeric;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_JOB_FEED_BASE_URL: &str = "https://api.adzuna.com/v1/api/jobs";
const DEFAULT_JOB_FEED_COUNTRY: &str = "in";
const DEFAULT_JOB_FEED_QUERY: &str = "software developer";
const DEFAULT_RESULTS_PER_PAGE: u32 = 200;
const DEFAULT_FEED_TIMEOUT_SEC: u64 = 30;
const GENERATED_SECRET_LEN: usize = 64;

const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://localhost:5174",
    "http://localhost:8080",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
    "http://127.0.0.1:8080",
];

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub jwt_secret: Option<String>,
    pub access_token_expire_minutes: u64,
    pub cors_origins: Vec<String>,
    pub job_feed_app_id: Option<String>,
    pub job_feed_app_key: Option<String>,
    pub job_feed_base_url: Option<String>,
    pub sync_interval_hours: u64,
    pub sync_on_startup: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            port: 8000,
            logging_level: RequestsLoggingLevel::default(),
            jwt_secret: None,
            access_token_expire_minutes: 30,
            cors_origins: Vec::new(),
            job_feed_app_id: None,
            job_feed_app_key: None,
            job_feed_base_url: None,
            sync_interval_hours: 24,
            sync_on_startup: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub cors_origins: Vec<String>,

    pub auth: AuthSettings,
    pub job_feed: JobFeedSettings,
}

#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub access_token_expire: Duration,
    /// True when no secret was configured and a random one was generated.
    pub secret_generated: bool,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_expire", &self.access_token_expire)
            .field("secret_generated", &self.secret_generated)
            .finish()
    }
}

#[derive(Clone)]
pub struct JobFeedSettings {
    pub enabled: bool, // true if both app_id and app_key are set
    pub app_id: String,
    pub app_key: String,
    pub base_url: String,
    pub country: String,
    pub query: String,
    pub results_per_page: u32,
    pub timeout: Duration,
    pub interval: Duration,
    pub sync_on_startup: bool,
}

impl std::fmt::Debug for JobFeedSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobFeedSettings")
            .field("enabled", &self.enabled)
            .field("app_id", &self.app_id)
            .field("app_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("country", &self.country)
            .field("query", &self.query)
            .field("results_per_page", &self.results_per_page)
            .field("timeout", &self.timeout)
            .field("interval", &self.interval)
            .field("sync_on_startup", &self.sync_on_startup)
            .finish()
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let cors_origins = file
            .cors_origins
            .or_else(|| (!cli.cors_origins.is_empty()).then(|| cli.cors_origins.clone()))
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect());

        let configured_secret = file
            .jwt_secret
            .or_else(|| cli.jwt_secret.clone())
            .filter(|s| !s.is_empty());
        let secret_generated = configured_secret.is_none();
        let jwt_secret = configured_secret.unwrap_or_else(|| {
            warn!("No JWT secret configured, generating a random one; issued tokens will not survive a restart");
            generate_secret()
        });
        let auth = AuthSettings {
            jwt_secret,
            access_token_expire: Duration::from_secs(
                file.access_token_expire_minutes
                    .unwrap_or(cli.access_token_expire_minutes)
                    * 60,
            ),
            secret_generated,
        };

        // Job feed settings - merge file config with CLI and defaults
        let feed_file = file.job_feed.unwrap_or_default();
        let app_id = feed_file
            .app_id
            .or_else(|| cli.job_feed_app_id.clone())
            .unwrap_or_default();
        let app_key = feed_file
            .app_key
            .or_else(|| cli.job_feed_app_key.clone())
            .unwrap_or_default();
        let job_feed = JobFeedSettings {
            enabled: !app_id.is_empty() && !app_key.is_empty(),
            app_id,
            app_key,
            base_url: feed_file
                .base_url
                .or_else(|| cli.job_feed_base_url.clone())
                .unwrap_or_else(|| DEFAULT_JOB_FEED_BASE_URL.to_string()),
            country: feed_file
                .country
                .unwrap_or_else(|| DEFAULT_JOB_FEED_COUNTRY.to_string()),
            query: feed_file
                .query
                .unwrap_or_else(|| DEFAULT_JOB_FEED_QUERY.to_string()),
            results_per_page: feed_file
                .results_per_page
                .unwrap_or(DEFAULT_RESULTS_PER_PAGE),
            timeout: Duration::from_secs(
                feed_file.timeout_sec.unwrap_or(DEFAULT_FEED_TIMEOUT_SEC),
            ),
            interval: Duration::from_secs(
                feed_file.interval_hours.unwrap_or(cli.sync_interval_hours) * 60 * 60,
            ),
            sync_on_startup: feed_file.sync_on_startup.unwrap_or(cli.sync_on_startup),
        };

        if job_feed.interval.is_zero() {
            bail!("Job feed sync interval must be at least one hour");
        }

        Ok(Self {
            db_dir,
            port,
            logging_level,
            cors_origins,
            auth,
            job_feed,
        })
    }

    pub fn user_db_path(&self) -> PathBuf {
        self.db_dir.join("user.db")
    }

    pub fn jobs_db_path(&self) -> PathBuf {
        self.db_dir.join("jobs.db")
    }
}

fn generate_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
