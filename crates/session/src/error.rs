//! Error types for session operations

use std::time::Duration;

/// Errors surfaced by the credential guard and retry policy.
///
/// `CredentialExhausted` and `Store` are fatal for the current account.
/// Everything else is a per-item failure: the caller logs it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no valid credential for {account} after {attempts} attempts")]
    CredentialExhausted { account: String, attempts: u32 },

    #[error("{action} still rate limited after {attempts} attempts")]
    RateLimitExhausted { action: String, attempts: u32 },

    #[error("{action} rate limited")]
    RateLimited {
        action: String,
        wait_hint: Option<Duration>,
    },

    #[error("{action} failed: {message}")]
    Failure { action: String, message: String },

    #[error("account store error: {0}")]
    Store(#[from] account_store::Error),
}

impl SessionError {
    /// Whether processing of the current account should stop.
    pub fn is_account_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::CredentialExhausted { .. } | SessionError::Store(_)
        )
    }
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
