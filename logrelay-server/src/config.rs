//! Relay configuration
//!
//! Every setting is read once at startup into an immutable [`Config`] which
//! is then handed explicitly to each component.

use logrelay_client::{CollectorSettings, IdentitySettings};
use logrelay_core::domain::checkpoint::Checkpoint;
use std::time::Duration;

use crate::service::report::ReportTime;

/// Largest page the identity provider will return
pub const MAX_BATCH_SIZE: usize = 100;

const DEFAULT_COLLECTOR_PORT: u16 = 8088;
const DEFAULT_COLLECTOR_PATH: &str = "/services/collector/event/1.0";
const DEFAULT_MAX_RUN_TIME: Duration = Duration::from_secs(20);

/// Relay configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Collector base URL, scheme and host (e.g. "https://splunk.example.com")
    pub splunk_url: String,
    /// HEC token
    pub splunk_token: String,
    pub splunk_port: u16,
    pub splunk_path: String,

    /// Identity provider tenant domain
    pub auth0_domain: String,
    pub auth0_client_id: String,
    pub auth0_client_secret: String,

    /// Page size for log retrieval (1..=100)
    pub batch_size: usize,
    /// Checkpoint used when nothing has been stored yet
    pub start_from: Option<Checkpoint>,
    /// Only forward these event type codes (empty = all)
    pub log_types: Vec<String>,
    /// Minimum severity to forward (0 = everything)
    pub log_level: u8,

    /// Slack incoming webhook; notifications are disabled without one
    pub slack_webhook_url: Option<String>,
    /// Also notify when a run succeeds
    pub slack_send_success: bool,
    /// Daily report slot; `None` disables the report
    pub daily_report_time: Option<ReportTime>,

    /// Stop requesting new pages after this long
    pub max_run_time: Duration,

    /// Postgres checkpoint store; in-memory store without one
    pub database_url: Option<String>,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Required: SPLUNK_URL, SPLUNK_TOKEN, AUTH0_DOMAIN, AUTH0_CLIENT_ID,
    /// AUTH0_CLIENT_SECRET. Everything else has a default.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary key/value source
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| anyhow::anyhow!("{} environment variable not set", key))
        };

        let splunk_port = match get("SPLUNK_COLLECTOR_PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("SPLUNK_COLLECTOR_PORT is not a valid port: {}", port))?,
            None => DEFAULT_COLLECTOR_PORT,
        };

        let batch_size = get("BATCH_SIZE")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_BATCH_SIZE)
            .clamp(1, MAX_BATCH_SIZE);

        let log_level = match get("LOG_LEVEL") {
            Some(level) => level
                .parse::<u8>()
                .map_err(|_| anyhow::anyhow!("LOG_LEVEL must be a number from 0 to 4: {}", level))?,
            None => 0,
        };

        let log_types = get("LOG_TYPES")
            .map(|types| {
                types
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        // An unparsable slot disables the report rather than falling back
        let daily_report_time = match get("DAILY_REPORT_TIME") {
            Some(time) => ReportTime::parse(&time),
            None => Some(ReportTime::default()),
        };

        let max_run_time = get("MAX_RUN_TIME")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_MAX_RUN_TIME);

        Ok(Self {
            splunk_url: require("SPLUNK_URL")?,
            splunk_token: require("SPLUNK_TOKEN")?,
            splunk_port,
            splunk_path: get("SPLUNK_COLLECTOR_PATH")
                .unwrap_or_else(|| DEFAULT_COLLECTOR_PATH.to_string()),
            auth0_domain: require("AUTH0_DOMAIN")?,
            auth0_client_id: require("AUTH0_CLIENT_ID")?,
            auth0_client_secret: require("AUTH0_CLIENT_SECRET")?,
            batch_size,
            start_from: get("START_FROM").map(Checkpoint::new),
            log_types,
            log_level,
            slack_webhook_url: get("SLACK_INCOMING_WEBHOOK_URL"),
            slack_send_success: parse_flag(get("SLACK_SEND_SUCCESS").as_deref()),
            daily_report_time,
            max_run_time,
            database_url: get("DATABASE_URL"),
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.splunk_token.is_empty() {
            anyhow::bail!("splunk_token cannot be empty");
        }

        if !is_http_url(&self.splunk_url) {
            anyhow::bail!("splunk_url must start with http:// or https://");
        }

        if self.auth0_domain.is_empty() {
            anyhow::bail!("auth0_domain cannot be empty");
        }

        if self.auth0_client_id.is_empty() || self.auth0_client_secret.is_empty() {
            anyhow::bail!("auth0 client credentials cannot be empty");
        }

        if let Some(url) = &self.slack_webhook_url {
            if !is_http_url(url) {
                anyhow::bail!("slack_webhook_url must start with http:// or https://");
            }
        }

        if self.log_level > 4 {
            anyhow::bail!("log_level must be between 0 and 4");
        }

        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            anyhow::bail!("batch_size must be between 1 and {}", MAX_BATCH_SIZE);
        }

        if self.max_run_time.is_zero() {
            anyhow::bail!("max_run_time must be greater than 0");
        }

        Ok(())
    }

    pub fn collector_settings(&self) -> CollectorSettings {
        CollectorSettings {
            url: self.splunk_url.clone(),
            port: self.splunk_port,
            path: self.splunk_path.clone(),
            token: self.splunk_token.clone(),
        }
    }

    pub fn identity_settings(&self) -> IdentitySettings {
        IdentitySettings {
            domain: self.auth0_domain.clone(),
            client_id: self.auth0_client_id.clone(),
            client_secret: self.auth0_client_secret.clone(),
        }
    }
}

/// Success notifications are opt-in through the literal string "true"
fn parse_flag(value: Option<&str>) -> bool {
    value == Some("true")
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config::from_lookup(|key| {
        let value = match key {
            "SPLUNK_URL" => "https://splunk.example.com",
            "SPLUNK_TOKEN" => "hec-token",
            "AUTH0_DOMAIN" => "tenant.auth0.com",
            "AUTH0_CLIENT_ID" => "client",
            "AUTH0_CLIENT_SECRET" => "secret",
            _ => return None,
        };
        Some(value.to_string())
    })
    .expect("test configuration is complete")
}
