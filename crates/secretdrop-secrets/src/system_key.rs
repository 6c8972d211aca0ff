//! System key handling.
//!
//! The system key wraps every stored record. It is resolved once at startup,
//! in priority order:
//! 1. `SECRETDROP_SYSTEM_KEY` environment variable (hex-encoded)
//! 2. `system_key` in the config file (hex-encoded)
//!
//! A missing or malformed key is a startup failure. A fresh key is never
//! generated implicitly: doing so would strand every record sealed under the
//! previous one.

use std::fmt;

use rand::RngCore;
use secretdrop_core::env::{self, SYSTEM_KEY_VAR};
use secretdrop_core::Config;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::KEY_LEN;
use crate::error::{Result, SecretError};

/// The 32-byte system-wide key. Zeroized on drop, never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SystemKey([u8; KEY_LEN]);

impl SystemKey {
    /// Build a key from raw bytes; anything but 32 bytes is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_LEN {
            return Err(SecretError::Configuration(format!(
                "system key must be exactly {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Parse a hex-encoded key.
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let mut bytes = hex::decode(hex_key.trim())
            .map_err(|_| SecretError::Configuration("system key is not valid hex".to_string()))?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Hex form, for handing a freshly generated key to an operator.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SystemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SystemKey([REDACTED])")
    }
}

/// Resolve the system key from the environment, then from `config`.
pub fn resolve_system_key(config: &Config) -> Result<SystemKey> {
    if let Some(hex_key) = env::get_var(SYSTEM_KEY_VAR) {
        debug!("using system key from environment variable");
        return SystemKey::from_hex(&hex_key);
    }

    if let Some(hex_key) = &config.system_key {
        debug!("using system key from config file");
        return SystemKey::from_hex(hex_key.expose_secret());
    }

    Err(SecretError::Configuration(format!(
        "no system key configured; set {SYSTEM_KEY_VAR} or `system_key` in the config file"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secretdrop_core::config::ConfigBuilder;

    #[test]
    fn test_hex_round_trip() {
        let key = SystemKey::generate();
        let parsed = SystemKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(parsed.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_invalid_hex() {
        let err = SystemKey::from_hex("not-valid-hex!").unwrap_err();
        assert!(matches!(err, SecretError::Configuration(_)));
        assert!(!err.to_string().contains("not-valid-hex!"));
    }

    #[test]
    fn test_wrong_length_key() {
        // 16 bytes instead of 32.
        let err = SystemKey::from_hex(&hex::encode([0u8; 16])).unwrap_err();
        assert!(matches!(err, SecretError::Configuration(_)));
        assert!(SystemKey::from_bytes(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = SystemKey::generate();
        let debug = format!("{:?}", key);
        assert_eq!(debug, "SystemKey([REDACTED])");
        assert!(!debug.contains(&key.to_hex()));
    }

    /// Covers both sources in one test so no other test observes the env var.
    #[test]
    fn test_resolution_order() {
        let from_config = SystemKey::generate();
        let config = ConfigBuilder::new().system_key(from_config.to_hex()).build();

        std::env::remove_var(SYSTEM_KEY_VAR);
        let resolved = resolve_system_key(&config).unwrap();
        assert_eq!(resolved.as_bytes(), from_config.as_bytes());

        let from_env = SystemKey::generate();
        std::env::set_var(SYSTEM_KEY_VAR, from_env.to_hex());
        let resolved = resolve_system_key(&config).unwrap();
        assert_eq!(resolved.as_bytes(), from_env.as_bytes());
        std::env::remove_var(SYSTEM_KEY_VAR);

        let missing = resolve_system_key(&Config::default()).unwrap_err();
        assert!(matches!(missing, SecretError::Configuration(_)));
    }
}
