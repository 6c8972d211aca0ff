//! Configuration loading and persistence.

use super::{Config, LogLevel};
use crate::env;
use crate::error::ConfigError;
use crate::paths;
use crate::secret::SecretString;
use std::fs;
use std::path::Path;

/// Byte length of the system key once hex-decoded.
const SYSTEM_KEY_LEN: usize = 32;

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to the default path.
    pub fn save_default(&self) -> Result<(), ConfigError> {
        let path = paths::config_file()?;
        self.save(&path)
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;

        // The file may hold the system key.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 doesn't have a serializer, so we use serde_json with pretty print
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        let lifecycle = &self.lifecycle;
        let policy = &self.policy;

        // 1. System key shape (never echo the value)
        if let Some(key) = &self.system_key {
            match hex::decode(key.expose_secret().trim()) {
                Ok(bytes) if bytes.len() == SYSTEM_KEY_LEN => {}
                Ok(bytes) => errors.push(format!(
                    "system_key must decode to {} bytes, got {}",
                    SYSTEM_KEY_LEN,
                    bytes.len()
                )),
                Err(_) => errors.push("system_key is not valid hex".to_string()),
            }
        }

        // 2. Retention ceiling and lifetimes
        if lifecycle.max_ttl_secs == 0 {
            errors.push("lifecycle.max_ttl_secs must be greater than 0".to_string());
        }
        if lifecycle.view_limited_ttl_secs == 0 {
            errors.push("lifecycle.view_limited_ttl_secs must be greater than 0".to_string());
        }
        if lifecycle.request_ttl_secs == 0 {
            errors.push("lifecycle.request_ttl_secs must be greater than 0".to_string());
        }

        // 3. Enumerated retention values
        if lifecycle.allowed_view_counts.is_empty() {
            errors.push("lifecycle.allowed_view_counts must not be empty".to_string());
        }
        if lifecycle.allowed_view_counts.contains(&0) {
            errors.push("lifecycle.allowed_view_counts must not contain 0".to_string());
        }
        if lifecycle.allowed_retention_days.is_empty() {
            errors.push("lifecycle.allowed_retention_days must not be empty".to_string());
        }
        if lifecycle.allowed_retention_days.contains(&0) {
            errors.push("lifecycle.allowed_retention_days must not contain 0".to_string());
        }

        // 4. Store access
        if lifecycle.store_timeout_ms == 0 {
            errors.push("lifecycle.store_timeout_ms must be greater than 0".to_string());
        }
        if lifecycle.max_cas_retries == 0 {
            errors.push("lifecycle.max_cas_retries must be greater than 0".to_string());
        }

        // 5. Input limits
        if policy.min_password_len == 0 {
            errors.push("policy.min_password_len must be greater than 0".to_string());
        }
        if policy.min_password_len > policy.max_password_len {
            errors.push(format!(
                "policy.min_password_len ({}) exceeds policy.max_password_len ({})",
                policy.min_password_len, policy.max_password_len
            ));
        }
        if policy.max_secret_bytes == 0 {
            errors.push("policy.max_secret_bytes must be greater than 0".to_string());
        }

        // 6. Base URL must be absolute http(s)
        match url::Url::parse(&self.service.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(format!(
                "service.base_url must use http or https, got '{}'",
                url.scheme()
            )),
            Err(e) => errors.push(format!("service.base_url is invalid: {}", e)),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Load configuration from the default path, falling back to defaults if no file exists.
    ///
    /// Environment overrides are applied either way.
    pub fn load_or_default() -> Self {
        let mut config = match Self::load_default() {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => Self::default(),
            Err(e) => {
                tracing::warn!("ignoring unreadable config file: {}", e);
                Self::default()
            }
        };
        config.apply_env_overrides();
        config
    }

    /// Apply `SECRETDROP_*` environment overrides in place.
    pub fn apply_env_overrides(&mut self) {
        if let Some(key) = env::get_var(env::SYSTEM_KEY_VAR) {
            self.system_key = Some(SecretString::new(key));
        }
        if let Some(base_url) = env::get_var(env::BASE_URL_VAR) {
            self.service.base_url = base_url;
        }
        if let Some(ms) = env::get_u64(env::MIN_RESPONSE_MS_VAR) {
            self.lifecycle.min_response_ms = ms;
        }
        if let Some(json) = env::get_bool(env::LOG_JSON_VAR) {
            self.logging.json = json;
        }
    }
}

/// Configuration builder for creating configs programmatically.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hex-encoded system key.
    pub fn system_key(mut self, hex_key: impl Into<String>) -> Self {
        self.config.system_key = Some(SecretString::new(hex_key.into()));
        self
    }

    /// Set the absolute lifetime ceiling.
    pub fn max_ttl_secs(mut self, secs: u64) -> Self {
        self.config.lifecycle.max_ttl_secs = secs;
        self
    }

    /// Set the retrieval floor latency.
    pub fn min_response_ms(mut self, ms: u64) -> Self {
        self.config.lifecycle.min_response_ms = ms;
        self
    }

    /// Set the store round-trip timeout.
    pub fn store_timeout_ms(mut self, ms: u64) -> Self {
        self.config.lifecycle.store_timeout_ms = ms;
        self
    }

    /// Set the view counts a policy may request.
    pub fn allowed_view_counts(mut self, counts: Vec<u32>) -> Self {
        self.config.lifecycle.allowed_view_counts = counts;
        self
    }

    /// Set the minimum password length.
    pub fn min_password_len(mut self, len: usize) -> Self {
        self.config.policy.min_password_len = len;
        self
    }

    /// Set the base URL for retrieval links.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.service.base_url = url.into();
        self
    }

    /// Set the log level.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Build the config.
    pub fn build(self) -> Config {
        self.config
    }
}
