//! Session and retry engine for questbot
//!
//! Combines the account store, the credential guard, the retry policy and
//! interruptible delays into a `Session` that mode runners drive one account
//! at a time.
//!
//! Call flow for a protected operation:
//! 1. `Session::ensure_valid()` confirms (or obtains) a cookie for the account
//! 2. `Session::with_retry()` sends the request, refreshing the cookie on
//!    auth failures and backing off on 429s
//! 3. Accepted cookies are written through to the account file
//! 4. Runners pause between actions with `delay::delay()`, which honors the
//!    run's cancellation token at slice boundaries

pub mod delay;
pub mod error;
pub mod guard;
pub mod operator;
pub mod retry;
pub mod run_state;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use delay::{DelayOutcome, DelayWindow};
pub use error::{Result, SessionError};
pub use guard::CredentialGuard;
pub use operator::Operator;
pub use retry::{RetryBudget, RetryPolicy};
pub use run_state::{PairPhase, RunState};
pub use tokio_util::sync::CancellationToken;

use std::sync::Arc;
use std::time::Duration;

use account_store::{AccountId, AccountStore};
use common::Secret;
use remote::{ApiRequest, RemoteOutcome, Transport};

/// Bounds shared by the guard and the retry policy.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Identity checks per `ensure_valid`/`refresh` before giving up
    pub credential_attempts: u32,
    /// Wait used for a 429 without a usable `retry-after`
    pub rate_limit_fallback: Duration,
    /// Cap on any server-supplied wait
    pub max_rate_limit_wait: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            credential_attempts: 3,
            rate_limit_fallback: Duration::from_secs(8),
            max_rate_limit_wait: Duration::from_secs(120),
        }
    }
}

/// Account store plus the guard and retry policy that act on it.
pub struct Session {
    store: AccountStore,
    transport: Arc<dyn Transport>,
    guard: CredentialGuard,
    retry: RetryPolicy,
    operator: Arc<dyn Operator>,
}

impl Session {
    pub fn new(
        store: AccountStore,
        transport: Arc<dyn Transport>,
        operator: Arc<dyn Operator>,
        limits: &Limits,
    ) -> Self {
        Self {
            store,
            transport: transport.clone(),
            guard: CredentialGuard::new(
                transport.clone(),
                operator.clone(),
                limits.credential_attempts,
            ),
            retry: RetryPolicy::new(
                transport,
                limits.rate_limit_fallback,
                limits.max_rate_limit_wait,
            ),
            operator,
        }
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AccountStore {
        &mut self.store
    }

    pub fn operator(&self) -> &dyn Operator {
        self.operator.as_ref()
    }

    pub fn label(&self, id: AccountId) -> &str {
        self.store.label(id)
    }

    pub async fn ensure_valid(&mut self, id: AccountId) -> Result<Secret<String>> {
        self.guard.ensure_valid(&mut self.store, id).await
    }

    /// Send `request` once with the stored cookie: no refresh, no retry.
    ///
    /// For best-effort reads that must never prompt the operator.
    pub async fn send_once(&self, id: AccountId, request: &ApiRequest) -> RemoteOutcome {
        self.transport
            .send(request, self.store.credential(id))
            .await
    }

    /// Send `request` for `id` under the retry policy with a fresh budget.
    pub async fn with_retry(
        &mut self,
        id: AccountId,
        action: &str,
        request: &ApiRequest,
        max_attempts: u32,
    ) -> Result<serde_json::Value> {
        self.retry
            .run(
                &self.guard,
                &mut self.store,
                id,
                action,
                request,
                max_attempts,
            )
            .await
    }
}
