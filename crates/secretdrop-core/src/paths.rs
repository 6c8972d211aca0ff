//! Path resolution utilities.

use crate::env;
use crate::error::ConfigError;
use std::path::PathBuf;

const CONFIG_FILE_NAME: &str = "secretdrop.json5";

/// Get the SecretDrop base directory (~/.secretdrop).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".secretdrop"))
}

/// Get the main config file path.
///
/// `SECRETDROP_CONFIG` wins over the default `~/.secretdrop/secretdrop.json5`.
pub fn config_file() -> Result<PathBuf, ConfigError> {
    if let Some(path) = env::get_var(env::CONFIG_VAR) {
        return Ok(PathBuf::from(path));
    }
    Ok(base_dir()?.join(CONFIG_FILE_NAME))
}
