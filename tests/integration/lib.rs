//! Shared fixtures for the integration tests.

use std::sync::Arc;

use secretdrop_core::Config;
use secretdrop_secrets::{LifecyclePolicy, MemoryTtlStore, SecretLifecycleManager, SystemKey};

/// A password that satisfies the default policy.
pub const PASSWORD: &str = "Str0ng!Pass1234";

/// A manager over a fresh in-memory store, with an ephemeral system key.
///
/// The store is returned too so tests can inspect or tamper with it.
pub fn manager(config: &Config) -> (Arc<SecretLifecycleManager>, Arc<MemoryTtlStore>) {
    let store = Arc::new(MemoryTtlStore::new());
    let policy = LifecyclePolicy::from_config(config).expect("valid test config");
    let manager = SecretLifecycleManager::new(store.clone(), SystemKey::generate(), policy);
    (Arc::new(manager), store)
}
