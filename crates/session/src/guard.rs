//! Credential guard
//!
//! Guarantees a cookie the identity endpoint accepted before a protected call
//! proceeds. When the stored cookie is missing or rejected, the operator is
//! asked for a replacement, up to `max_attempts` times. Every accepted cookie
//! is written through to the account file so a hand-supplied replacement
//! survives restarts.
//!
//! This path is not rate-limit aware: a 429 or any other non-auth failure on
//! the identity check propagates immediately.

use std::sync::Arc;

use account_store::{AccountId, AccountStore};
use common::Secret;
use remote::{ApiRequest, RemoteOutcome, Transport};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::operator::Operator;

const IDENTITY_ACTION: &str = "identity check";

pub struct CredentialGuard {
    transport: Arc<dyn Transport>,
    operator: Arc<dyn Operator>,
    max_attempts: u32,
}

impl CredentialGuard {
    pub fn new(
        transport: Arc<dyn Transport>,
        operator: Arc<dyn Operator>,
        max_attempts: u32,
    ) -> Self {
        Self {
            transport,
            operator,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Return a validated cookie for `id`, prompting the operator if the
    /// stored one is empty or rejected.
    ///
    /// A valid stored cookie is re-persisted (idempotent) and never prompts.
    pub async fn ensure_valid(
        &self,
        store: &mut AccountStore,
        id: AccountId,
    ) -> Result<Secret<String>> {
        let label = store.label(id).to_string();

        for attempt in 1..=self.max_attempts {
            let mut candidate = store.credential(id).to_string();
            if candidate.is_empty() {
                match self.solicit(&label, "no valid session cookie") {
                    Some(c) => candidate = c,
                    None => {
                        warn!(account = %label, attempt, "no cookie supplied");
                        continue;
                    }
                }
            }

            if self.check(&label, &candidate).await? {
                store.persist_credential(id, candidate.clone()).await?;
                return Ok(Secret::new(candidate));
            }

            warn!(account = %label, attempt, max_attempts = self.max_attempts, "session cookie rejected");
            store.clear_credential(id);
        }

        Err(SessionError::CredentialExhausted {
            account: label,
            attempts: self.max_attempts,
        })
    }

    /// Obtain a fresh cookie from the operator after the current one was
    /// rejected mid-session. The rejected value is never retried.
    pub async fn refresh(
        &self,
        store: &mut AccountStore,
        id: AccountId,
        reason: &str,
    ) -> Result<Secret<String>> {
        let label = store.label(id).to_string();
        store.clear_credential(id);

        for attempt in 1..=self.max_attempts {
            let Some(candidate) = self.solicit(&label, reason) else {
                warn!(account = %label, attempt, "no cookie supplied");
                continue;
            };

            if self.check(&label, &candidate).await? {
                store.persist_credential(id, candidate.clone()).await?;
                info!(account = %label, "session refreshed");
                return Ok(Secret::new(candidate));
            }

            warn!(account = %label, attempt, max_attempts = self.max_attempts, "replacement cookie rejected");
        }

        Err(SessionError::CredentialExhausted {
            account: label,
            attempts: self.max_attempts,
        })
    }

    /// Run the identity check. Ok(true) accepted, Ok(false) rejected.
    async fn check(&self, label: &str, credential: &str) -> Result<bool> {
        match self
            .transport
            .send(&ApiRequest::identity(), credential)
            .await
        {
            RemoteOutcome::Ok(payload) => {
                let user = payload
                    .get("username")
                    .and_then(|v| v.as_str())
                    .unwrap_or("?");
                let balance = payload.get("balance").and_then(|v| v.as_f64());
                info!(account = %label, user, balance, "session valid");
                Ok(true)
            }
            RemoteOutcome::AuthInvalid(status) => {
                debug!(account = %label, status, "identity check rejected cookie");
                Ok(false)
            }
            RemoteOutcome::RateLimited { wait_hint, .. } => {
                warn!(account = %label, action = IDENTITY_ACTION, "rate limited");
                Err(SessionError::RateLimited {
                    action: IDENTITY_ACTION.into(),
                    wait_hint,
                })
            }
            RemoteOutcome::Failure(message) => {
                warn!(account = %label, action = IDENTITY_ACTION, error = %message, "identity check failed");
                Err(SessionError::Failure {
                    action: IDENTITY_ACTION.into(),
                    message,
                })
            }
        }
    }

    fn solicit(&self, label: &str, reason: &str) -> Option<String> {
        let prompt = format!("[{label}] {reason}. Paste a session cookie");
        self.operator
            .prompt_line(&prompt)
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
    }
}
