//! In-process [`TtlStore`] backed by a sharded concurrent map.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::{StoreResult, TtlStore};

#[derive(Debug)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// A TTL store held in memory.
///
/// Expired keys are invisible immediately and physically removed lazily on
/// access, by [`MemoryTtlStore::purge_expired`], or by the optional reaper
/// task. Conditional writes run under the key's shard lock, so they are
/// atomic against every other write on that key.
#[derive(Debug, Default)]
pub struct MemoryTtlStore {
    entries: DashMap<String, Entry>,
    latency: Option<Duration>,
}

impl MemoryTtlStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that sleeps for `latency` before every operation.
    ///
    /// Lets tests exercise store timeouts and latency variance.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            latency: Some(latency),
        }
    }

    /// Number of keys currently held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every expired key. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    /// Spawn a background task that purges expired keys every `every`.
    ///
    /// The task holds only a weak reference and exits once the store is
    /// dropped; abort the handle to stop it sooner.
    pub fn spawn_reaper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                let purged = store.purge_expired();
                if purged > 0 {
                    debug!(purged, "evicted expired keys");
                }
            }
        })
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl TtlStore for MemoryTtlStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.simulate_latency().await;
        let now = Instant::now();

        match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
            None => return Ok(None),
        }

        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> StoreResult<()> {
        self.simulate_latency().await;
        let expires_at = Instant::now() + ttl;
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.simulate_latency().await;
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.is_live(now)))
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        replacement: Option<Vec<u8>>,
    ) -> StoreResult<bool> {
        self.simulate_latency().await;
        let now = Instant::now();

        let Some(value) = replacement else {
            let removed = self
                .entries
                .remove_if(key, |_, entry| entry.is_live(now) && entry.value == expected);
            return Ok(removed.is_some());
        };

        let Some(mut entry) = self.entries.get_mut(key) else {
            return Ok(false);
        };
        if !entry.is_live(now) || entry.value != expected {
            return Ok(false);
        }
        // Expiry is left untouched.
        entry.value = value;
        Ok(true)
    }
}
