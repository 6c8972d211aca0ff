//! Dual-encrypted secret storage for SecretDrop.
//!
//! Secrets are sealed twice with AES-256-GCM: once under a key derived from
//! the recipient's password, then under a system key. Records live in a TTL
//! key-value store and are retired by view count or by age.

pub mod crypto;
pub mod error;
pub mod lifecycle;
mod requests;
pub mod store;
pub mod system_key;
pub mod types;

pub use error::{Result, SecretError};
pub use lifecycle::{LifecyclePolicy, SecretLifecycleManager};
pub use store::{MemoryTtlStore, StoreError, TtlStore};
pub use system_key::{resolve_system_key, SystemKey};
pub use types::{
    CreateRequestParams, RecordStatus, RequestStatus, RetentionPolicy, Retrieved,
    RetrievalRecord, SecretRequest, Submission,
};
