//! Service configuration loaded via OrthoConfig.
//!
//! Values come from `ENGAGEMENT_*` environment variables, an optional
//! configuration file, and command-line flags, in OrthoConfig's usual
//! precedence. Every field is optional; accessors apply the defaults.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAIL_SENDER: &str = "noreply@engagement.invalid";
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_LEASE_SECS: u64 = 30;
const DEFAULT_REQUEUE_DELAY_MS: u64 = 1_000;
const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 10;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid bind address '{value}': {message}")]
    BindAddr { value: String, message: String },
    #[error("invalid mail endpoint '{value}': {message}")]
    MailEndpoint { value: String, message: String },
    #[error("{0} is required")]
    Missing(&'static str),
}

/// Settings shared by the API server and the worker binaries.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ENGAGEMENT")]
pub struct ServiceSettings {
    /// PostgreSQL connection URL. The API server runs on in-memory adapters
    /// when absent; the workers refuse to start.
    pub database_url: Option<String>,
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// HTTP endpoint of the mail relay.
    pub mail_endpoint: Option<String>,
    /// Bearer token for the mail relay.
    pub mail_api_key: Option<String>,
    /// `from` address on outgoing mail.
    pub mail_sender: Option<String>,
    /// Mail relay request timeout in seconds.
    pub mail_timeout_secs: Option<u64>,
    /// Worker back-off when a queue is empty or unreachable.
    pub poll_interval_ms: Option<u64>,
    /// How long a received message stays claimed.
    pub lease_secs: Option<u64>,
    /// Delay before a requeued message is redelivered.
    pub requeue_delay_ms: Option<u64>,
    /// Delivery attempt at which the reward worker gives up on a ledger
    /// write that keeps failing.
    pub reward_max_attempts: Option<u32>,
    /// Apply embedded migrations on start-up.
    #[ortho_config(default = false)]
    pub run_migrations: bool,
}

impl ServiceSettings {
    /// Parse the configured bind address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| ConfigError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    /// The database URL, or an error naming the missing setting.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("ENGAGEMENT_DATABASE_URL"))
    }

    /// Parsed relay endpoint, if one is configured.
    pub fn mail_endpoint(&self) -> Result<Option<Url>, ConfigError> {
        self.mail_endpoint
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|err| ConfigError::MailEndpoint {
                    value: raw.to_owned(),
                    message: err.to_string(),
                })
            })
            .transpose()
    }

    pub fn mail_sender(&self) -> &str {
        self.mail_sender.as_deref().unwrap_or(DEFAULT_MAIL_SENDER)
    }

    pub fn mail_timeout(&self) -> Duration {
        Duration::from_secs(self.mail_timeout_secs.unwrap_or(DEFAULT_MAIL_TIMEOUT_SECS))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_secs.unwrap_or(DEFAULT_LEASE_SECS).max(1))
    }

    pub fn requeue_delay(&self) -> Duration {
        Duration::from_millis(self.requeue_delay_ms.unwrap_or(DEFAULT_REQUEUE_DELAY_MS))
    }
}
