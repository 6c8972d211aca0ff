//! CLI command implementations.

pub mod config;
pub mod keygen;
pub mod seal;
pub mod selftest;

use std::path::Path;

use secretdrop_core::error::ConfigError;
use secretdrop_core::Config;

/// Load configuration, honouring an explicit `--config` path.
///
/// An explicit path must parse if it exists; a missing file falls back to defaults.
/// Environment overrides apply in both cases.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            let mut config = match Config::load(path) {
                Ok(config) => config,
                // `config init` creates it.
                Err(ConfigError::NotFound(_)) => Config::default(),
                Err(e) => anyhow::bail!("Failed to load config {}: {}", path.display(), e),
            };
            config.apply_env_overrides();
            Ok(config)
        }
        None => Ok(Config::load_or_default()),
    }
}

/// Read a password from the flag or prompt for it without echo.
pub(crate) fn read_password(given: Option<String>, confirm: bool) -> anyhow::Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    let password = rpassword::prompt_password("Password: ")
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))?;
    if confirm {
        let again = rpassword::prompt_password("Confirm password: ")
            .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))?;
        if again != password {
            anyhow::bail!("Passwords do not match");
        }
    }
    Ok(password)
}
