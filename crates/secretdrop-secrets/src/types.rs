//! Core types for secret requests and retrieval records.
//!
//! Provides the persisted documents (`SecretRequest`, `RetrievalRecord`) and
//! the values handed back to callers.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secretdrop_core::SecretString;
use serde::{Deserialize, Serialize};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// How long, or for how many reads, a secret stays retrievable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Deleted after this many successful retrievals.
    ViewLimited(u32),
    /// Deleted after this many days.
    TimeLimited(u32),
}

impl RetentionPolicy {
    /// The lifetime this policy asks for, before any ceiling is applied.
    ///
    /// View-limited records have no intrinsic lifetime, so the caller
    /// supplies the one configured for them.
    pub fn requested_ttl(&self, view_limited_ttl: Duration) -> Duration {
        match self {
            RetentionPolicy::ViewLimited(_) => view_limited_ttl,
            RetentionPolicy::TimeLimited(days) => DAY.saturating_mul(*days),
        }
    }

    /// Initial view counter, if the policy counts views.
    pub fn initial_views(&self) -> Option<u32> {
        match self {
            RetentionPolicy::ViewLimited(n) => Some(*n),
            RetentionPolicy::TimeLimited(_) => None,
        }
    }
}

/// Whether a request has been answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Fulfilled,
}

/// A request for someone to submit a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRequest {
    pub id: String,

    /// How to reach the person who asked, e.g. an email address.
    pub requestor: String,

    /// What is being asked for, shown to the submitter.
    pub description: String,

    pub retention: RetentionPolicy,

    pub status: RequestStatus,

    pub created_at: DateTime<Utc>,

    /// Set exactly once, when the request is fulfilled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_id: Option<String>,
}

/// Parameters for creating a new secret request.
#[derive(Debug, Clone)]
pub struct CreateRequestParams {
    pub requestor: String,
    pub description: String,
    pub retention: RetentionPolicy,
}

/// A dual-encrypted secret as persisted in the store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalRecord {
    pub id: String,

    /// Owning request; `None` for records created directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// System-layer envelope, `iv:tag:ciphertext` in hex.
    pub envelope: String,

    /// Verification hash, `salt:hash` in hex.
    pub password_hash: String,

    /// Remaining successful retrievals for view-limited records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views_remaining: Option<u32>,

    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

impl RetrievalRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

// Keep the password hash out of logs.
impl fmt::Debug for RetrievalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrievalRecord")
            .field("id", &self.id)
            .field("request_id", &self.request_id)
            .field("envelope_len", &self.envelope.len())
            .field("password_hash", &"[REDACTED]")
            .field("views_remaining", &self.views_remaining)
            .field("expires_at", &self.expires_at)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// The result of a successful retrieval.
#[derive(Debug)]
pub struct Retrieved {
    /// Decrypted secret. Redacted under `Debug`, zeroed on drop.
    pub plaintext: SecretString,

    /// Views left after this one; `Some(0)` means the record is now gone.
    pub views_remaining: Option<u32>,
}

/// Metadata about a live record. Carries no secret material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStatus {
    pub id: String,
    pub views_remaining: Option<u32>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&RetrievalRecord> for RecordStatus {
    fn from(record: &RetrievalRecord) -> Self {
        Self {
            id: record.id.clone(),
            views_remaining: record.views_remaining,
            expires_at: record.expires_at,
            created_at: record.created_at,
        }
    }
}

/// Outcome of fulfilling a request.
#[derive(Debug, Clone)]
pub struct Submission {
    /// The request, now `Fulfilled`.
    pub request: SecretRequest,

    pub record: RetrievalRecord,

    /// Link for the notification collaborator to deliver to the requestor.
    pub retrieval_url: String,
}
