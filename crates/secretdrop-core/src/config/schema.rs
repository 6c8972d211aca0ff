//! Configuration schema definitions.

use crate::secret::SecretString;
use serde::{Deserialize, Serialize};

const DAY_SECS: u64 = 24 * 60 * 60;

/// Main SecretDrop configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Hex-encoded 32-byte system key.
    ///
    /// `SECRETDROP_SYSTEM_KEY` takes precedence when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_key: Option<SecretString>,

    /// Retention and timing settings for stored secrets.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Semantic limits on caller input.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Public-facing service settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Retention, expiry, and timing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Absolute ceiling on any record's lifetime, in seconds.
    #[serde(default = "default_max_ttl_secs")]
    pub max_ttl_secs: u64,

    /// Lifetime of a view-limited record, in seconds (still capped by `max_ttl_secs`).
    #[serde(default = "default_view_limited_ttl_secs")]
    pub view_limited_ttl_secs: u64,

    /// View counts a view-limited policy may request.
    #[serde(default = "default_allowed_view_counts")]
    pub allowed_view_counts: Vec<u32>,

    /// Day counts a time-limited policy may request.
    #[serde(default = "default_allowed_retention_days")]
    pub allowed_retention_days: Vec<u32>,

    /// Floor latency for retrieval lookups, in milliseconds.
    #[serde(default = "default_min_response_ms")]
    pub min_response_ms: u64,

    /// Timeout applied to every store round-trip, in milliseconds.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Conditional-write attempts before a view decrement gives up.
    #[serde(default = "default_max_cas_retries")]
    pub max_cas_retries: u32,

    /// Extra store lifetime past a record's logical expiry, in seconds.
    #[serde(default = "default_expiry_grace_secs")]
    pub expiry_grace_secs: u64,

    /// Lifetime of an unfulfilled secret request, in seconds.
    #[serde(default = "default_request_ttl_secs")]
    pub request_ttl_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_ttl_secs: default_max_ttl_secs(),
            view_limited_ttl_secs: default_view_limited_ttl_secs(),
            allowed_view_counts: default_allowed_view_counts(),
            allowed_retention_days: default_allowed_retention_days(),
            min_response_ms: default_min_response_ms(),
            store_timeout_ms: default_store_timeout_ms(),
            max_cas_retries: default_max_cas_retries(),
            expiry_grace_secs: default_expiry_grace_secs(),
            request_ttl_secs: default_request_ttl_secs(),
        }
    }
}

fn default_max_ttl_secs() -> u64 {
    30 * DAY_SECS
}

fn default_view_limited_ttl_secs() -> u64 {
    7 * DAY_SECS
}

fn default_allowed_view_counts() -> Vec<u32> {
    vec![1, 2]
}

fn default_allowed_retention_days() -> Vec<u32> {
    vec![1, 3, 7, 30]
}

fn default_min_response_ms() -> u64 {
    750
}

fn default_store_timeout_ms() -> u64 {
    2_000
}

fn default_max_cas_retries() -> u32 {
    5
}

fn default_expiry_grace_secs() -> u64 {
    60 * 60
}

fn default_request_ttl_secs() -> u64 {
    7 * DAY_SECS
}

/// Semantic limits enforced by the core on caller input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Minimum password length, in characters.
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,

    /// Maximum password length, in characters.
    #[serde(default = "default_max_password_len")]
    pub max_password_len: usize,

    /// Maximum plaintext size, in bytes.
    #[serde(default = "default_max_secret_bytes")]
    pub max_secret_bytes: usize,

    /// Maximum request description length, in characters.
    #[serde(default = "default_max_description_len")]
    pub max_description_len: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_password_len: default_min_password_len(),
            max_password_len: default_max_password_len(),
            max_secret_bytes: default_max_secret_bytes(),
            max_description_len: default_max_description_len(),
        }
    }
}

fn default_min_password_len() -> usize {
    12
}

fn default_max_password_len() -> usize {
    128
}

fn default_max_secret_bytes() -> usize {
    10_000
}

fn default_max_description_len() -> usize {
    500
}

/// Public-facing service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL retrieval links are built from.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The directive string understood by `tracing` filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
