//! Transport layer for the remote game service
//!
//! Defines the `Transport` trait that decouples the session engine from HTTP.
//! A transport issues exactly one request and turns the response into a
//! `RemoteOutcome`; it never retries. Retry, re-authentication and pacing
//! live in the `session` crate.

pub mod classify;
pub mod constants;
pub mod http;
pub mod request;

pub use classify::{classify_response, is_auth_failure, parse_retry_after};
pub use http::HttpTransport;
pub use request::ApiRequest;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Classified result of one remote call.
///
/// Exactly one variant per call:
/// - Ok carries the parsed JSON payload
/// - RateLimited is only produced for HTTP 429
/// - AuthInvalid means the session cookie was rejected
/// - Failure covers everything else (network errors, business errors)
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome {
    Ok(serde_json::Value),
    RateLimited {
        /// Parsed `retry-after`, floored at one second. None if absent or unparseable.
        wait_hint: Option<Duration>,
        /// Raw `retry-after` header value
        raw: Option<String>,
    },
    AuthInvalid(u16),
    Failure(String),
}

impl RemoteOutcome {
    /// Variant label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            RemoteOutcome::Ok(_) => "ok",
            RemoteOutcome::RateLimited { .. } => "rate_limited",
            RemoteOutcome::AuthInvalid(_) => "auth_invalid",
            RemoteOutcome::Failure(_) => "failure",
        }
    }
}

/// Errors from building a transport.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(String),
}

/// Result alias for transport construction.
pub type Result<T> = std::result::Result<T, Error>;

/// One remote call, credential supplied per call.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    /// Send `request` with `credential` as the cookie header and classify the reply.
    fn send<'a>(
        &'a self,
        request: &'a ApiRequest,
        credential: &'a str,
    ) -> Pin<Box<dyn Future<Output = RemoteOutcome> + Send + 'a>>;
}
