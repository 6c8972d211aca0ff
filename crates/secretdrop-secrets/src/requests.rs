//! Secret requests: ask someone to send you a secret.
//!
//! A request is created `Pending`, and fulfilled exactly once by a
//! submission. Fulfilment is a conditional write on the request document,
//! so two racing submitters cannot both succeed.

use chrono::Utc;
use secretdrop_core::id;
use tracing::{info, warn};

use crate::error::{Result, SecretError};
use crate::lifecycle::{decode, encode, SecretLifecycleManager};
use crate::types::{CreateRequestParams, RequestStatus, SecretRequest, Submission};

const REQUEST_PREFIX: &str = "request:";

fn request_key(id: &str) -> String {
    format!("{REQUEST_PREFIX}{id}")
}

impl SecretLifecycleManager {
    /// Open a new pending request.
    pub async fn create_request(&self, params: CreateRequestParams) -> Result<SecretRequest> {
        self.policy.check_retention(&params.retention)?;

        let requestor = params.requestor.trim();
        if requestor.is_empty() {
            return Err(SecretError::Validation(
                "requestor contact must not be empty".to_string(),
            ));
        }
        if params.description.chars().count() > self.policy.max_description_len {
            return Err(SecretError::Validation(format!(
                "description must be at most {} characters",
                self.policy.max_description_len
            )));
        }

        let request = SecretRequest {
            id: id::uuid(),
            requestor: requestor.to_string(),
            description: params.description,
            retention: params.retention,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            retrieval_id: None,
        };

        self.store_call(self.store.set(
            &request_key(&request.id),
            encode(&request)?,
            self.policy.request_ttl,
        ))
        .await?;

        info!(request_id = %request.id, retention = ?request.retention, "secret request created");
        Ok(request)
    }

    pub async fn get_request(&self, id: &str) -> Result<SecretRequest> {
        self.load_request(id).await.map(|(request, _)| request)
    }

    /// Fulfil a pending request with a secret.
    ///
    /// The record takes the request's retention policy. If another
    /// submission wins the race, the record created here is deleted again.
    pub async fn submit(&self, request_id: &str, secret: &str, password: &str) -> Result<Submission> {
        let (request, raw) = self.load_request(request_id).await?;
        if request.status == RequestStatus::Fulfilled {
            return Err(already_fulfilled());
        }

        let record = self
            .create_record(Some(request.id.clone()), secret, password, request.retention)
            .await?;

        let mut fulfilled = request;
        fulfilled.status = RequestStatus::Fulfilled;
        fulfilled.retrieval_id = Some(record.id.clone());

        let swapped = match encode(&fulfilled) {
            Ok(bytes) => {
                self.store_call(self.store.compare_and_swap(
                    &request_key(&fulfilled.id),
                    &raw,
                    Some(bytes),
                ))
                .await
            }
            Err(e) => Err(e),
        };

        match swapped {
            Ok(true) => {}
            Ok(false) => {
                self.delete(&record.id).await?;
                return Err(match self.load_request(request_id).await {
                    Ok(_) => already_fulfilled(),
                    Err(e) => e,
                });
            }
            Err(e) => {
                if let Err(rollback) = self.delete(&record.id).await {
                    warn!(
                        retrieval_id = %record.id,
                        error = %rollback,
                        "failed to remove record after aborted submission"
                    );
                }
                return Err(e);
            }
        }

        let retrieval_url = self.retrieval_url(&record.id)?;
        info!(
            request_id = %fulfilled.id,
            retrieval_id = %record.id,
            "secret request fulfilled"
        );
        Ok(Submission {
            request: fulfilled,
            record,
            retrieval_url,
        })
    }

    /// Public link for a retrieval record: `{base_url}/retrieve/{id}`.
    pub fn retrieval_url(&self, id: &str) -> Result<String> {
        self.policy
            .base_url
            .join(&format!("retrieve/{id}"))
            .map(String::from)
            .map_err(|e| SecretError::Configuration(format!("cannot build retrieval URL: {e}")))
    }

    async fn load_request(&self, id: &str) -> Result<(SecretRequest, Vec<u8>)> {
        if !id::is_well_formed(id) {
            return Err(SecretError::NotFound);
        }
        let raw = self
            .store_call(self.store.get(&request_key(id)))
            .await?
            .ok_or(SecretError::NotFound)?;
        let request = decode(&raw)?;
        Ok((request, raw))
    }
}

fn already_fulfilled() -> SecretError {
    SecretError::Validation("this request has already been fulfilled".to_string())
}
