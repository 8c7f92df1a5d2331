use anyhow::{Context, Result, bail};
use dotenv::dotenv;
use log::info;
use serde::Deserialize;

use crate::common::{DEFAULT_SCOPE_PREFIX, MAX_RETRIES};

/// Deployment settings, read once at startup and passed to every stage.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Bucket holding the uploaded images
    pub bucket_name: String,
    /// Public CDN origin, e.g. `https://cdn.example.com`
    pub cdn_base_url: String,
    /// CloudFront distribution fronting the bucket
    pub cdn_distribution_id: String,
    /// Only keys under this prefix are normalized
    #[serde(default = "default_scope_prefix")]
    pub scope_prefix: String,
    /// Retry budget; a file at or over this count is reported and left alone
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Secret holding the `slack_api_token`
    #[serde(default = "default_slack_secret_id")]
    pub slack_secret_id: String,
    #[serde(default = "default_slack_channel")]
    pub slack_channel: String,
}

fn default_scope_prefix() -> String {
    DEFAULT_SCOPE_PREFIX.to_string()
}

fn default_max_retries() -> u32 {
    MAX_RETRIES
}

fn default_slack_secret_id() -> String {
    "slack-alerts".to_string()
}

fn default_slack_channel() -> String {
    "#image-alerts".to_string()
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let config = Self::from_vars(std::env::vars())?;
        info!(
            "Loaded config: bucket={}, prefix={}, distribution={}",
            config.bucket_name, config.scope_prefix, config.cdn_distribution_id
        );
        Ok(config)
    }

    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config: AppConfig =
            envy::from_iter(vars).context("failed to read configuration from environment")?;

        for (name, value) in [
            ("BUCKET_NAME", &config.bucket_name),
            ("CDN_BASE_URL", &config.cdn_base_url),
            ("CDN_DISTRIBUTION_ID", &config.cdn_distribution_id),
        ] {
            if value.trim().is_empty() {
                bail!("{} must not be empty", name);
            }
        }

        config.cdn_base_url = config.cdn_base_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    pub fn is_in_scope(&self, key: &str) -> bool {
        crate::workflow::processors::filter::is_in_scope(key, &self.scope_prefix)
    }

    /// Public URL under which the object is served
    pub fn cdn_url(&self, key: &str) -> String {
        format!("{}/{}", self.cdn_base_url, key.trim_start_matches('/'))
    }

    /// Path handed to the CDN invalidation request
    pub fn invalidation_path(&self, key: &str) -> String {
        format!("/{}", key.trim_start_matches('/'))
    }
}
