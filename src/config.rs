//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{AppError, Result};

/// Keychain service name under which SMTP secrets are looked up.
const KEYRING_SERVICE: &str = "agenda-citas";

/// SMTP submission port used when neither the file, the keychain, nor the
/// environment supplies one.
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Company identity shown in pages and confirmation emails.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct CompanyConfig {
    /// Display name used as sender name and in the email subject.
    pub name: String,
    /// Contact phone number.
    pub phone: String,
    /// Public contact email address.
    pub email: String,
}

impl Default for CompanyConfig {
    fn default() -> Self {
        Self {
            name: "Mi Empresa".into(),
            phone: "+1 (555) 123-4567".into(),
            email: "contacto@miempresa.com".into(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct HttpConfig {
    /// Interface address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// TCP port to listen on; 0 lets the OS choose.
    #[serde(default = "default_http_port")]
    pub port: u16,
    /// Public base URL used to build confirmation links.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_bind() -> String {
    "127.0.0.1".into()
}

fn default_http_port() -> u16 {
    8000
}

fn default_base_url() -> String {
    "http://localhost:8000".into()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_http_port(),
            base_url: default_base_url(),
        }
    }
}

impl HttpConfig {
    /// Socket address assembled from `bind` and `port`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `bind` is not a valid IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|err| AppError::Config(format!("invalid http bind address: {err}")))
    }
}

/// Appointment date and business-hours settings.
///
/// Business hours are informational: they are rendered on the booking page
/// but not enforced against the submitted time.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct SchedulingConfig {
    /// Minimum number of days between today and the appointment date.
    pub min_lead_days: u32,
    /// Opening time (`HH:MM`).
    pub opening_time: String,
    /// Closing time (`HH:MM`).
    pub closing_time: String,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            min_lead_days: 0,
            opening_time: "09:00".into(),
            closing_time: "17:00".into(),
        }
    }
}

/// Character-count bounds applied to submitted text fields.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct ValidationConfig {
    /// Minimum requester name length.
    pub name_min_chars: usize,
    /// Maximum requester name length.
    pub name_max_chars: usize,
    /// Minimum description length.
    pub description_min_chars: usize,
    /// Maximum description length.
    pub description_max_chars: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            name_min_chars: 3,
            name_max_chars: 100,
            description_min_chars: 10,
            description_max_chars: 500,
        }
    }
}

/// Record store backend selector.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Single pretty-printed JSON array on disk.
    #[default]
    Json,
    /// Embedded `SQLite` database.
    Sqlite,
}

/// Durable storage settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct StorageConfig {
    /// Which backend holds the appointment records.
    pub backend: StorageBackend,
    /// Path of the JSON file or `SQLite` database.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            path: PathBuf::from("citas.json"),
        }
    }
}

/// Outbound SMTP settings.
///
/// Host, port, and username left unset in the TOML file are resolved at
/// runtime from the OS keychain, then the environment. The password is
/// never read from the file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SmtpConfig {
    /// SMTP relay host (keychain `smtp_host`, then `SMTP_SERVER`).
    #[serde(default)]
    pub host: Option<String>,
    /// SMTP submission port (keychain `smtp_port`, then `SMTP_PORT`, then 587).
    #[serde(default)]
    pub port: Option<u16>,
    /// Account used for login and as the sender address (keychain
    /// `smtp_username`, then `SMTP_EMAIL`).
    #[serde(default)]
    pub username: Option<String>,
    /// Account password (populated at runtime).
    #[serde(skip)]
    pub password: Option<String>,
    /// Upper bound on a single delivery attempt.
    #[serde(default = "default_smtp_timeout")]
    pub timeout_seconds: u64,
    /// Delivery attempts per message before it is dropped.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Capacity of the outgoing notification queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_smtp_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_queue_capacity() -> usize {
    256
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            username: None,
            password: None,
            timeout_seconds: default_smtp_timeout(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Fully resolved SMTP credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpCredentials {
    /// Relay host.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Login account, also used as the sender address.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl SmtpConfig {
    /// Resolved credentials, or `None` when any of host, username, or
    /// password is missing or empty.
    #[must_use]
    pub fn credentials(&self) -> Option<SmtpCredentials> {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());
        Some(SmtpCredentials {
            host: non_empty(&self.host)?,
            port: self.port.unwrap_or(DEFAULT_SMTP_PORT),
            username: non_empty(&self.username)?,
            password: non_empty(&self.password)?,
        })
    }

    /// Per-attempt delivery timeout.
    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Initial retry backoff.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn default_log_level() -> String {
    "info".into()
}

/// Global configuration parsed from `agenda-citas.toml`.
///
/// Every section is optional; an empty document yields the defaults.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Default tracing filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Company identity.
    #[serde(default)]
    pub company: CompanyConfig,
    /// HTTP listener.
    #[serde(default)]
    pub http: HttpConfig,
    /// Date and business-hours rules.
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    /// Text field bounds.
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Record store location.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Outbound mail.
    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            company: CompanyConfig::default(),
            http: HttpConfig::default(),
            scheduling: SchedulingConfig::default(),
            validation: ValidationConfig::default(),
            storage: StorageConfig::default(),
            smtp: SmtpConfig::default(),
        }
    }
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

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        if config.log_level.trim().is_empty() {
            config.log_level = default_log_level();
        }
        config.validate()?;
        Ok(config)
    }

    /// Fill in missing SMTP settings from the OS keychain and environment.
    ///
    /// Each of host, port, and username is taken from the config file when
    /// set there, otherwise from the keychain, otherwise from `SMTP_SERVER`,
    /// `SMTP_PORT`, or `SMTP_EMAIL`. The password always comes from the
    /// keychain or `SMTP_PASSWORD`. Missing values are not an error:
    /// notifications are simply disabled.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a keychain lookup task panics.
    pub async fn load_credentials(&mut self) -> Result<()> {
        if is_unset(self.smtp.host.as_deref()) {
            self.smtp.host = load_credential("smtp_host", "SMTP_SERVER").await?;
        }
        if self.smtp.port.is_none() {
            if let Some(port) = load_credential("smtp_port", "SMTP_PORT").await? {
                match port.trim().parse() {
                    Ok(parsed) => self.smtp.port = Some(parsed),
                    Err(err) => warn!(%port, %err, "ignoring unparsable smtp port"),
                }
            }
        }
        if is_unset(self.smtp.username.as_deref()) {
            self.smtp.username = load_credential("smtp_username", "SMTP_EMAIL").await?;
        }
        self.smtp.password = load_credential("smtp_password", "SMTP_PASSWORD").await?;

        if let Some(credentials) = self.smtp.credentials() {
            info!(host = %credentials.host, port = credentials.port, "smtp credentials loaded");
        } else {
            warn!("smtp credentials incomplete; confirmation emails will not be sent");
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let bounds = &self.validation;
        if bounds.name_min_chars > bounds.name_max_chars {
            return Err(AppError::Config(
                "validation.name_min_chars must not exceed name_max_chars".into(),
            ));
        }
        if bounds.description_min_chars > bounds.description_max_chars {
            return Err(AppError::Config(
                "validation.description_min_chars must not exceed description_max_chars".into(),
            ));
        }

        if self.http.base_url.trim().is_empty() {
            return Err(AppError::Config("http.base_url must not be empty".into()));
        }

        let opening = parse_business_time("scheduling.opening_time", &self.scheduling.opening_time)?;
        let closing = parse_business_time("scheduling.closing_time", &self.scheduling.closing_time)?;
        if opening >= closing {
            return Err(AppError::Config(
                "scheduling.opening_time must be earlier than closing_time".into(),
            ));
        }

        if self.smtp.max_attempts == 0 {
            return Err(AppError::Config(
                "smtp.max_attempts must be greater than zero".into(),
            ));
        }
        if self.smtp.timeout_seconds == 0 {
            return Err(AppError::Config(
                "smtp.timeout_seconds must be greater than zero".into(),
            ));
        }
        if self.smtp.queue_capacity == 0 {
            return Err(AppError::Config(
                "smtp.queue_capacity must be greater than zero".into(),
            ));
        }

        if self.storage.path.as_os_str().is_empty() {
            return Err(AppError::Config("storage.path must not be empty".into()));
        }

        Ok(())
    }
}

fn parse_business_time(field: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|err| AppError::Config(format!("{field} must be HH:MM: {err}")))
}

fn is_unset(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
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
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            tracing::debug!(key = keyring_key, ?err, "keychain lookup failed, trying env var");
        }
    }

    Ok(env::var(env_key).ok().filter(|value| !value.is_empty()))
}
