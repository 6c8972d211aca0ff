//! Secret lifecycle: creation, retrieval, view counting, expiry.
//!
//! Record states, as seen through [`SecretLifecycleManager::retrieve`]:
//!
//! ```text
//! Active(views: N | none) --retrieve--> Active(N-1) | Exhausted (deleted)
//! Active --now > expires_at--> Expired (deleted on first access)
//! Active --delete--> Deleted
//! ```
//!
//! Exhausted, expired-and-collected, and deleted records are all reported as
//! [`SecretError::NotFound`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use secretdrop_core::{id, Config, SecretString};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;
use zeroize::Zeroizing;

use crate::crypto::{decrypt_dual, encrypt_dual, verify_password, Envelope};
use crate::error::{Result, SecretError};
use crate::store::{StoreError, StoreResult, TtlStore};
use crate::system_key::{resolve_system_key, SystemKey};
use crate::types::{RecordStatus, RetentionPolicy, RetrievalRecord, Retrieved};

const RECORD_PREFIX: &str = "retrieval:";

pub(crate) fn record_key(id: &str) -> String {
    format!("{RECORD_PREFIX}{id}")
}

/// Runtime settings for the lifecycle manager, resolved from [`Config`].
#[derive(Debug, Clone)]
pub struct LifecyclePolicy {
    /// Absolute ceiling on a record's lifetime.
    pub max_ttl: Duration,
    pub view_limited_ttl: Duration,
    pub allowed_view_counts: Vec<u32>,
    pub allowed_retention_days: Vec<u32>,
    /// Floor latency for the lookup/expiry/verification phase of a retrieval.
    pub min_response_time: Duration,
    pub store_timeout: Duration,
    pub max_cas_retries: u32,
    /// How long the store keeps a record past its logical expiry, so that a
    /// late retrieval is answered with `Expired` rather than `NotFound`.
    pub expiry_grace: Duration,
    pub request_ttl: Duration,
    pub min_password_len: usize,
    pub max_password_len: usize,
    pub max_secret_bytes: usize,
    pub max_description_len: usize,
    /// Always ends in `/`.
    pub base_url: Url,
}

impl LifecyclePolicy {
    /// Validate `config` and convert it into a policy.
    pub fn from_config(config: &Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| SecretError::Configuration(e.to_string()))?;

        let lifecycle = &config.lifecycle;
        let policy = &config.policy;

        let mut base_url = Url::parse(&config.service.base_url)
            .map_err(|e| SecretError::Configuration(format!("invalid base_url: {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            max_ttl: Duration::from_secs(lifecycle.max_ttl_secs),
            view_limited_ttl: Duration::from_secs(lifecycle.view_limited_ttl_secs),
            allowed_view_counts: lifecycle.allowed_view_counts.clone(),
            allowed_retention_days: lifecycle.allowed_retention_days.clone(),
            min_response_time: Duration::from_millis(lifecycle.min_response_ms),
            store_timeout: Duration::from_millis(lifecycle.store_timeout_ms),
            max_cas_retries: lifecycle.max_cas_retries,
            expiry_grace: Duration::from_secs(lifecycle.expiry_grace_secs),
            request_ttl: Duration::from_secs(lifecycle.request_ttl_secs),
            min_password_len: policy.min_password_len,
            max_password_len: policy.max_password_len,
            max_secret_bytes: policy.max_secret_bytes,
            max_description_len: policy.max_description_len,
            base_url,
        })
    }

    /// Lifetime for `retention`, clamped to the ceiling.
    pub fn ttl_for(&self, retention: &RetentionPolicy) -> Duration {
        retention
            .requested_ttl(self.view_limited_ttl)
            .min(self.max_ttl)
    }

    pub(crate) fn check_retention(&self, retention: &RetentionPolicy) -> Result<()> {
        match *retention {
            RetentionPolicy::ViewLimited(n) if !self.allowed_view_counts.contains(&n) => {
                Err(SecretError::Validation(format!(
                    "view count {n} is not allowed; choose one of {:?}",
                    self.allowed_view_counts
                )))
            }
            RetentionPolicy::TimeLimited(days) if !self.allowed_retention_days.contains(&days) => {
                Err(SecretError::Validation(format!(
                    "retention of {days} days is not allowed; choose one of {:?}",
                    self.allowed_retention_days
                )))
            }
            _ => Ok(()),
        }
    }

    fn check_password(&self, password: &str) -> Result<()> {
        let len = password.chars().count();
        if len < self.min_password_len {
            return Err(SecretError::Validation(format!(
                "password must be at least {} characters",
                self.min_password_len
            )));
        }
        if len > self.max_password_len {
            return Err(SecretError::Validation(format!(
                "password must be at most {} characters",
                self.max_password_len
            )));
        }
        Ok(())
    }

    fn check_secret(&self, secret: &str) -> Result<()> {
        if secret.is_empty() {
            return Err(SecretError::Validation("secret must not be empty".to_string()));
        }
        if secret.len() > self.max_secret_bytes {
            return Err(SecretError::Validation(format!(
                "secret exceeds the maximum of {} bytes",
                self.max_secret_bytes
            )));
        }
        Ok(())
    }
}

/// Creates, serves, and retires dual-encrypted secrets.
///
/// The store is injected; the manager holds no other shared state, so any
/// number of calls may run concurrently against one instance.
pub struct SecretLifecycleManager {
    pub(crate) store: Arc<dyn TtlStore>,
    system_key: SystemKey,
    pub(crate) policy: LifecyclePolicy,
}

impl SecretLifecycleManager {
    pub fn new(store: Arc<dyn TtlStore>, system_key: SystemKey, policy: LifecyclePolicy) -> Self {
        Self {
            store,
            system_key,
            policy,
        }
    }

    /// Build a manager from configuration, resolving the system key.
    ///
    /// Fails at startup, not per request, on a bad key or invalid settings.
    pub fn from_config(store: Arc<dyn TtlStore>, config: &Config) -> Result<Self> {
        let policy = LifecyclePolicy::from_config(config)?;
        let system_key = resolve_system_key(config)?;
        Ok(Self::new(store, system_key, policy))
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    /// Encrypt and store a secret under `password`.
    pub async fn create(
        &self,
        secret: &str,
        password: &str,
        retention: RetentionPolicy,
    ) -> Result<RetrievalRecord> {
        self.create_record(None, secret, password, retention).await
    }

    pub(crate) async fn create_record(
        &self,
        request_id: Option<String>,
        secret: &str,
        password: &str,
        retention: RetentionPolicy,
    ) -> Result<RetrievalRecord> {
        self.policy.check_retention(&retention)?;
        self.policy.check_password(password)?;
        self.policy.check_secret(secret)?;

        let ttl = self.policy.ttl_for(&retention);
        let sealed = {
            let secret = Zeroizing::new(secret.to_owned());
            let password = Zeroizing::new(password.to_owned());
            let system_key = self.system_key.clone();
            offload(move || encrypt_dual(secret.as_bytes(), password.as_bytes(), &system_key))
                .await?
        };

        let now = Utc::now();
        let lifetime = chrono::Duration::from_std(ttl)
            .map_err(|_| SecretError::Configuration("retention ceiling is out of range".to_string()))?;

        let record = RetrievalRecord {
            id: id::token(),
            request_id,
            envelope: sealed.envelope.to_string(),
            password_hash: sealed.password_hash.to_string(),
            views_remaining: retention.initial_views(),
            expires_at: now + lifetime,
            created_at: now,
        };

        let bytes = encode(&record)?;
        self.store_call(
            self.store
                .set(&record_key(&record.id), bytes, ttl + self.policy.expiry_grace),
        )
        .await?;

        info!(
            id = %record.id,
            views = ?record.views_remaining,
            expires_at = %record.expires_at,
            "retrieval record created"
        );
        Ok(record)
    }

    /// Verify `password` and return the secret, consuming a view if counted.
    ///
    /// Lookup, expiry check, and password verification all finish no earlier
    /// than `min_response_time` after entry, whichever way they end.
    pub async fn retrieve(&self, id: &str, password: &str) -> Result<Retrieved> {
        let started = Instant::now();
        let gate = self.authorize(id, password).await;
        tokio::time::sleep_until(started + self.policy.min_response_time).await;
        let (record, raw) = gate?;

        let plaintext = self.open(&record, password).await?;

        let views_remaining = match record.views_remaining {
            Some(_) => Some(self.consume_view(record, raw).await?),
            None => None,
        };

        info!(id, views_remaining = ?views_remaining, "secret retrieved");
        Ok(Retrieved {
            plaintext,
            views_remaining,
        })
    }

    /// Metadata for a live record, without touching its secret.
    pub async fn status(&self, id: &str) -> Result<RecordStatus> {
        let (record, _) = self.load_live(id).await?;
        Ok(RecordStatus::from(&record))
    }

    /// Remove a record. Deleting an absent record succeeds.
    pub async fn delete(&self, id: &str) -> Result<()> {
        if !id::is_well_formed(id) {
            return Ok(());
        }
        let removed = self.store_call(self.store.delete(&record_key(id))).await?;
        if removed {
            info!(id, "retrieval record deleted");
        }
        Ok(())
    }

    /// Steps a-c of a retrieval: load, expire, verify.
    async fn authorize(&self, id: &str, password: &str) -> Result<(RetrievalRecord, Vec<u8>)> {
        let (record, raw) = self.load_live(id).await?;

        let verified = {
            let password = Zeroizing::new(password.to_owned());
            let stored = record.password_hash.clone();
            offload(move || verify_password(password.as_bytes(), &stored)).await?
        };
        if !verified {
            debug!(id, "password verification failed");
            return Err(SecretError::InvalidPassword);
        }
        Ok((record, raw))
    }

    /// Load a record, deleting and reporting it if past expiry.
    async fn load_live(&self, id: &str) -> Result<(RetrievalRecord, Vec<u8>)> {
        if !id::is_well_formed(id) {
            return Err(SecretError::NotFound);
        }
        let key = record_key(id);

        let raw = self
            .store_call(self.store.get(&key))
            .await?
            .ok_or(SecretError::NotFound)?;
        let record: RetrievalRecord = decode(&raw)?;

        if record.is_expired_at(Utc::now()) {
            self.store_call(self.store.delete(&key)).await?;
            info!(id, "retrieval record expired and deleted");
            return Err(SecretError::Expired);
        }
        Ok((record, raw))
    }

    async fn open(&self, record: &RetrievalRecord, password: &str) -> Result<SecretString> {
        let opened = {
            let sealed = record.envelope.clone();
            let password = Zeroizing::new(password.to_owned());
            let system_key = self.system_key.clone();
            offload(move || {
                let envelope: Envelope = sealed.parse()?;
                decrypt_dual(&envelope, password.as_bytes(), &system_key)
            })
            .await
        };
        let plaintext = match opened {
            Ok(plaintext) => plaintext,
            Err(e) if e.is_retryable() => return Err(e),
            Err(_) => {
                warn!(id = %record.id, "record failed decryption after password verification");
                return Err(SecretError::Decryption);
            }
        };

        let text = std::str::from_utf8(&plaintext).map_err(|_| {
            warn!(id = %record.id, "decrypted secret is not valid UTF-8");
            SecretError::Decryption
        })?;
        Ok(SecretString::new(text))
    }

    /// Decrement the view counter with conditional writes.
    ///
    /// Returns the count left after this view. Losing a race reloads and
    /// retries; finding the record gone means another caller took the last
    /// view.
    async fn consume_view(&self, mut record: RetrievalRecord, mut raw: Vec<u8>) -> Result<u32> {
        let key = record_key(&record.id);

        for attempt in 1..=self.policy.max_cas_retries {
            let current = match record.views_remaining {
                Some(n) if n > 0 => n,
                _ => return Err(SecretError::NotFound),
            };
            let next = current - 1;

            let replacement = if next == 0 {
                None
            } else {
                let mut updated = record.clone();
                updated.views_remaining = Some(next);
                Some(encode(&updated)?)
            };

            if self
                .store_call(self.store.compare_and_swap(&key, &raw, replacement))
                .await?
            {
                if next == 0 {
                    info!(id = %record.id, "final view consumed; record deleted");
                }
                return Ok(next);
            }

            debug!(id = %record.id, attempt, "view decrement lost a race; reloading");
            raw = self
                .store_call(self.store.get(&key))
                .await?
                .ok_or(SecretError::NotFound)?;
            record = decode(&raw)?;
        }

        warn!(id = %record.id, "gave up on view decrement after repeated conflicts");
        Err(StoreError::Contention.into())
    }

    /// Run a store call under the configured timeout.
    pub(crate) async fn store_call<T>(
        &self,
        call: impl Future<Output = StoreResult<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.policy.store_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!(
                    timeout_ms = self.policy.store_timeout.as_millis() as u64,
                    "store call timed out"
                );
                Err(StoreError::Timeout.into())
            }
        }
    }
}

impl std::fmt::Debug for SecretLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretLifecycleManager")
            .field("system_key", &self.system_key)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Run key derivation and the ciphers on the blocking pool.
///
/// PBKDF2 takes tens of milliseconds; on a worker thread it would stall
/// every other task there, floor timers included.
async fn offload<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|_| {
        warn!("crypto task did not complete");
        SecretError::Retryable("crypto task did not complete".to_string())
    })?
}

pub(crate) fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|_| SecretError::Configuration("failed to encode stored document".to_string()))
}

/// A stored document that fails to parse is an integrity failure.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(raw: &[u8]) -> Result<T> {
    serde_json::from_slice(raw).map_err(|_| {
        warn!("stored document is malformed");
        SecretError::Decryption
    })
}
