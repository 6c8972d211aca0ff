//! Environment variable handling.
//!
//! Every override lives under the `SECRETDROP_` prefix. Empty values are
//! treated as unset.

use std::env;

/// Hex-encoded system key. Takes precedence over `system_key` in the file.
pub const SYSTEM_KEY_VAR: &str = "SECRETDROP_SYSTEM_KEY";

/// Overrides `service.base_url`.
pub const BASE_URL_VAR: &str = "SECRETDROP_BASE_URL";

/// Overrides the config file location.
pub const CONFIG_VAR: &str = "SECRETDROP_CONFIG";

/// Overrides `lifecycle.min_response_ms`.
pub const MIN_RESPONSE_MS_VAR: &str = "SECRETDROP_MIN_RESPONSE_MS";

/// Overrides `logging.json`.
pub const LOG_JSON_VAR: &str = "SECRETDROP_LOG_JSON";

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable as a boolean; unrecognised values are `None`.
pub fn get_bool(name: &str) -> Option<bool> {
    get_var(name).and_then(|v| match v.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}

/// Get an environment variable as a u64.
pub fn get_u64(name: &str) -> Option<u64> {
    get_var(name).and_then(|v| v.parse().ok())
}
