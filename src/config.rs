//! Application configuration.
//!
//! Lives at `<config dir>/delaywatch/delaywatch.toml` unless `--config` points
//! elsewhere. Every key has a default, so an absent default file is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::decision::AlertPolicy;
use crate::error::{DelayError, Result};
use crate::feeds::build_search_url;

const CONFIG_DIR_NAME: &str = "delaywatch";
const CONFIG_FILE_NAME: &str = "delaywatch.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub alert: AlertPolicy,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub sms: SmsConfig,
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_query")]
    pub query: String,

    #[serde(default = "default_results_per_page")]
    pub results_per_page: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Full query URL. When set, `base_url`, `query` and `results_per_page` are ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            query: default_query(),
            results_per_page: default_results_per_page(),
            timeout_secs: default_timeout_secs(),
            url: None,
        }
    }
}

impl SearchConfig {
    pub fn url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => build_search_url(&self.base_url, &self.query, self.results_per_page),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://search.twitter.com/search.json".into()
}
fn default_query() -> String {
    "caltrain".into()
}
fn default_results_per_page() -> u32 {
    100
}
fn default_timeout_secs() -> u64 {
    20
}

/// `[poll]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_interval_secs() -> u64 {
    15 * 60
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default = "default_subscriptions_path")]
    pub subscriptions_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            subscriptions_path: default_subscriptions_path(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("tweet_logs")
}
fn default_subscriptions_path() -> PathBuf {
    PathBuf::from("subscriptions.json")
}

/// `[sms]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub account_sid: String,

    /// Name of the env var holding the auth token (never store the token itself).
    #[serde(default = "default_auth_token_env")]
    pub auth_token_env: String,

    #[serde(default)]
    pub from_number: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            account_sid: String::new(),
            auth_token_env: default_auth_token_env(),
            from_number: String::new(),
        }
    }
}

impl SmsConfig {
    pub fn auth_token(&self) -> Result<String> {
        match std::env::var(&self.auth_token_env) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(DelayError::config(format!(
                "env var {} is not set; export it or run with --dry-run",
                self.auth_token_env
            ))),
        }
    }
}

fn default_api_base() -> String {
    "https://api.twilio.com/2010-04-01".into()
}
fn default_auth_token_env() -> String {
    "TWILIO_AUTH_TOKEN".into()
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(raw).map_err(|e| DelayError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll.interval_secs == 0 {
            return Err(DelayError::config("poll.interval_secs must be positive"));
        }
        if !(1..=100).contains(&self.search.results_per_page) {
            return Err(DelayError::config(
                "search.results_per_page must be between 1 and 100",
            ));
        }
        if self.search.url.is_none() && self.search.query.trim().is_empty() {
            return Err(DelayError::config("search.query is empty"));
        }
        if self.alert.delay_percentage > 100 {
            return Err(DelayError::config(
                "alert.delay_percentage must be at most 100",
            ));
        }
        Ok(())
    }
}

/// `<config dir>/delaywatch/delaywatch.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load config from `path`, or from the default location.
///
/// An explicit path must exist; a missing default file yields defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return Ok(AppConfig::default()),
        },
    };

    match std::fs::read_to_string(&path) {
        Ok(raw) => AppConfig::from_toml_str(&raw),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
            Ok(AppConfig::default())
        }
        Err(e) => Err(DelayError::io(path, e)),
    }
}
