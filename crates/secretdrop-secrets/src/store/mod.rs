//! TTL key-value store boundary.
//!
//! Defines the [`TtlStore`] trait the lifecycle manager is written against,
//! and provides [`MemoryTtlStore`], an in-process implementation with native
//! per-key expiry and atomic conditional writes.

mod memory;

pub use memory::MemoryTtlStore;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failures reported by a store backend.
///
/// Messages must not include keys or values.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store operation timed out")]
    Timeout,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("contention on a conditional write")]
    Contention,
}

/// Result alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Async trait for TTL key-value stores.
///
/// Implementations must evict keys once their TTL elapses and must make
/// [`TtlStore::compare_and_swap`] atomic with respect to every other write
/// on the same key.
#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Fetch the current value, or `None` if absent or expired.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Unconditionally write `value`, expiring after `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> StoreResult<()>;

    /// Remove `key`. Returns whether anything was removed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Replace the value only if it still equals `expected`.
    ///
    /// `Some(new)` keeps the key's remaining TTL; `None` deletes the key.
    /// Returns `false` when the key is absent or holds something else.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        replacement: Option<Vec<u8>>,
    ) -> StoreResult<bool>;
}
