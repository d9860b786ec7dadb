//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{AppError, Result};

/// Keyring service name used for runtime credentials.
const KEYRING_SERVICE: &str = "task-tracker";

/// Environment variable consulted when the keychain has no job token.
pub const JOB_TOKEN_ENV: &str = "TASK_TRACKER_JOB_TOKEN";

/// Notification and unread-badge settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct NotificationConfig {
    /// How long a transient notice stays visible.
    #[serde(default = "default_notice_duration_ms")]
    pub notice_duration_ms: u64,
    /// Sample rate used when rendering the audible cue.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Periodic unread refresh interval; 0 disables polling.
    #[serde(default)]
    pub unread_poll_seconds: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            notice_duration_ms: default_notice_duration_ms(),
            sample_rate: default_sample_rate(),
            unread_poll_seconds: 0,
        }
    }
}

fn default_notice_duration_ms() -> u64 {
    5000
}

fn default_sample_rate() -> u32 {
    44_100
}

/// In-process trigger times for the rollover jobs (UTC, `HH:MM`).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ScheduleConfig {
    /// Whether the built-in daily scheduler runs inside `serve`.
    #[serde(default)]
    pub enabled: bool,
    /// Time of day the reset job fires.
    #[serde(default = "default_reset_at")]
    pub reset_at: String,
    /// Time of day the duplication job fires.
    #[serde(default = "default_duplicate_at")]
    pub duplicate_at: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            reset_at: default_reset_at(),
            duplicate_at: default_duplicate_at(),
        }
    }
}

fn default_reset_at() -> String {
    "00:00".into()
}

fn default_duplicate_at() -> String {
    "00:05".into()
}

impl ScheduleConfig {
    /// Parsed trigger time for the reset job.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `reset_at` is not `HH:MM`.
    pub fn reset_time(&self) -> Result<NaiveTime> {
        parse_time_of_day("reset_at", &self.reset_at)
    }

    /// Parsed trigger time for the duplication job.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `duplicate_at` is not `HH:MM`.
    pub fn duplicate_time(&self) -> Result<NaiveTime> {
        parse_time_of_day("duplicate_at", &self.duplicate_at)
    }
}

fn parse_time_of_day(field: &str, raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|err| AppError::Config(format!("{field} must be HH:MM, got {raw:?}: {err}")))
}

fn default_http_host() -> String {
    "127.0.0.1".into()
}

fn default_http_port() -> u16 {
    8080
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Path to the `SQLite` database file.
    pub db_path: PathBuf,
    /// Interface the HTTP server binds to.
    #[serde(default = "default_http_host")]
    pub http_host: String,
    /// Port the HTTP server binds to.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Notice, cue, and badge polling settings.
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Built-in rollover scheduler.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Bearer token guarding the job endpoints (populated at runtime).
    #[serde(skip)]
    pub job_token: Option<String>,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the job endpoint token from OS keychain with env-var fallback.
    ///
    /// A missing token is not an error: the job routes are then served
    /// without a bearer guard.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the keychain task panics.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.job_token = load_credential("job_token", JOB_TOKEN_ENV).await?;
        if self.job_token.is_none() {
            warn!("no job token configured; job endpoints are unauthenticated");
        }
        Ok(())
    }

    /// Socket address string the HTTP server binds to.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    fn validate(&self) -> Result<()> {
        if self.db_path.as_os_str().is_empty() {
            return Err(AppError::Config("db_path must not be empty".into()));
        }

        if self.notifications.sample_rate == 0 {
            return Err(AppError::Config(
                "notifications.sample_rate must be greater than zero".into(),
            ));
        }

        self.schedule.reset_time()?;
        self.schedule.duplicate_time()?;

        Ok(())
    }
}

/// Load a single optional credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<Option<String>> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(Some(value)),
        Ok(_) => {
            debug!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            debug!(key = keyring_key, ?err, "keychain lookup failed, trying env var");
        }
    }

    Ok(env::var(env_key).ok().filter(|value| !value.is_empty()))
}
