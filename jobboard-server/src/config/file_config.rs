use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub jwt_secret: Option<String>,
    pub access_token_expire_minutes: Option<u64>,
    pub cors_origins: Option<Vec<String>>,

    pub job_feed: Option<JobFeedConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct JobFeedConfig {
    pub app_id: Option<String>,
    pub app_key: Option<String>,
    pub base_url: Option<String>,
    /// Two-letter country segment of the search URL, e.g. "in" or "gb".
    pub country: Option<String>,
    pub query: Option<String>,
    pub results_per_page: Option<u32>,
    pub timeout_sec: Option<u64>,
    pub interval_hours: Option<u64>,
    pub sync_on_startup: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
