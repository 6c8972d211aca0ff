//! Config save/load roundtrip integration tests.
//!
//! These tests verify that configuration can be written to disk, loaded
//! back, and turned into a lifecycle policy.

use std::path::Path;
use std::time::Duration;

use secretdrop_core::config::Config;
use secretdrop_secrets::{LifecyclePolicy, SystemKey};
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secretdrop.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.lifecycle.max_ttl_secs, config.lifecycle.max_ttl_secs);
    assert_eq!(
        loaded.lifecycle.allowed_view_counts,
        config.lifecycle.allowed_view_counts
    );
    assert_eq!(loaded.policy.min_password_len, config.policy.min_password_len);
    assert_eq!(loaded.service.base_url, config.service.base_url);
}

#[test]
fn test_saved_system_key_resolves() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("secretdrop.json5");

    let key = SystemKey::generate();
    let mut config = Config::default();
    config.system_key = Some(key.to_hex().into());
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    loaded.validate().unwrap();
    assert_eq!(
        loaded.system_key.as_ref().map(|k| k.expose_secret().to_string()),
        Some(key.to_hex())
    );
}

#[test]
fn test_json5_file_becomes_policy() {
    let config = Config::parse(
        r#"{
            // comments and trailing commas are allowed
            lifecycle: { min_response_ms: 250, allowed_view_counts: [1, 2, 5], },
            service: { base_url: "https://drop.example.com/app" },
        }"#,
    )
    .unwrap();

    let policy = LifecyclePolicy::from_config(&config).unwrap();
    assert_eq!(policy.min_response_time, Duration::from_millis(250));
    assert_eq!(policy.allowed_view_counts, vec![1, 2, 5]);
    assert_eq!(policy.base_url.as_str(), "https://drop.example.com/app/");
}

#[test]
fn test_invalid_settings_are_rejected_by_policy() {
    let config = Config::parse("{ lifecycle: { store_timeout_ms: 0 } }").unwrap();
    assert!(LifecyclePolicy::from_config(&config).is_err());
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/secretdrop.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    let result = Config::parse("not valid json");
    assert!(result.is_err());
}
