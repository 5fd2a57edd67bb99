//! Retry policy around a single remote operation
//!
//! Per attempt:
//! - AuthInvalid: refresh through the guard and resend. Does not consume budget.
//! - RateLimited: wait for the server hint (capped) or the fallback, add
//!   jitter, consume one attempt.
//! - Failure: surface immediately, no blind retry.
//! - Ok: return the payload.
//!
//! Auth-triggered resends are bounded only by the guard's own attempt limit
//! per refresh, not by the operation budget.

use std::sync::Arc;
use std::time::Duration;

use account_store::{AccountId, AccountStore};
use common::Secret;
use remote::{ApiRequest, RemoteOutcome, Transport};
use tracing::warn;

use crate::delay;
use crate::error::{Result, SessionError};
use crate::guard::CredentialGuard;

/// Attempt accounting for one logical operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    pub attempts_used: u32,
    pub max_attempts: u32,
}

impl RetryBudget {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempts_used: 0,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn consume(&mut self) {
        self.attempts_used += 1;
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts_used >= self.max_attempts
    }
}

pub struct RetryPolicy {
    transport: Arc<dyn Transport>,
    fallback_wait: Duration,
    max_wait: Duration,
}

impl RetryPolicy {
    pub fn new(transport: Arc<dyn Transport>, fallback_wait: Duration, max_wait: Duration) -> Self {
        Self {
            transport,
            fallback_wait,
            max_wait,
        }
    }

    /// How long to back off for a 429 with the given hint.
    pub fn rate_limit_wait(&self, hint: Option<Duration>) -> Duration {
        hint.unwrap_or(self.fallback_wait).min(self.max_wait)
    }

    /// Run `request` for account `id` with up to `max_attempts` rate-limited tries.
    ///
    /// An empty stored cookie is routed through `guard.ensure_valid` before
    /// the first send.
    pub async fn run(
        &self,
        guard: &CredentialGuard,
        store: &mut AccountStore,
        id: AccountId,
        action: &str,
        request: &ApiRequest,
        max_attempts: u32,
    ) -> Result<serde_json::Value> {
        let label = store.label(id).to_string();
        let mut budget = RetryBudget::new(max_attempts);

        let stored = store.credential(id).to_string();
        let mut credential = if stored.is_empty() {
            guard.ensure_valid(store, id).await?
        } else {
            Secret::new(stored)
        };

        loop {
            match self.transport.send(request, credential.expose()).await {
                RemoteOutcome::Ok(payload) => return Ok(payload),
                RemoteOutcome::AuthInvalid(status) => {
                    warn!(account = %label, action, status, "session rejected, refreshing");
                    credential = guard
                        .refresh(store, id, &format!("session rejected during {action}"))
                        .await?;
                }
                RemoteOutcome::RateLimited { wait_hint, raw } => {
                    budget.consume();
                    let wait = self.rate_limit_wait(wait_hint);
                    warn!(
                        account = %label,
                        action,
                        attempt = budget.attempts_used,
                        max_attempts = budget.max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        retry_after = raw.as_deref().unwrap_or("-"),
                        "rate limited"
                    );
                    tokio::time::sleep(wait).await;
                    delay::jitter().await;
                    if budget.is_exhausted() {
                        warn!(account = %label, action, "rate limit budget exhausted, skipping");
                        return Err(SessionError::RateLimitExhausted {
                            action: action.to_string(),
                            attempts: budget.attempts_used,
                        });
                    }
                }
                RemoteOutcome::Failure(message) => {
                    warn!(account = %label, action, error = %message, "remote call failed");
                    return Err(SessionError::Failure {
                        action: action.to_string(),
                        message,
                    });
                }
            }
        }
    }
}
