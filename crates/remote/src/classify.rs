//! Response classification
//!
//! Turns (status, retry-after header, body text) into a `RemoteOutcome`.
//! Order matters: 429 is checked before the body is parsed because rate-limit
//! bodies are often not JSON. The auth heuristic is applied the same way
//! whether or not the body parsed, since the remote service reports expired
//! sessions inconsistently (bare 403 pages, or 200 with `success: false`).

use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::RemoteOutcome;
use crate::constants::SNIPPET_LEN;

/// Body/message fragments that indicate a rejected or expired session.
const AUTH_PATTERNS: &[&str] = &[
    "unauthorized",
    "forbidden",
    "expired",
    "cookie",
    "login",
    "session",
];

/// Shortest wait honored for a 429 hint.
pub const MIN_RATE_LIMIT_WAIT: Duration = Duration::from_millis(1000);

/// Classify a complete HTTP response.
pub fn classify_response(status: u16, retry_after: Option<&str>, body: &str) -> RemoteOutcome {
    if status == 429 {
        return RemoteOutcome::RateLimited {
            wait_hint: retry_after.and_then(|v| parse_retry_after(v, SystemTime::now())),
            raw: retry_after.map(str::to_owned),
        };
    }

    let payload: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => {
            if is_auth_failure(status, body) {
                return RemoteOutcome::AuthInvalid(status);
            }
            return RemoteOutcome::Failure(format!("HTTP {status}: {}", snippet(body)));
        }
    };

    let status_failed = !(200..300).contains(&status);
    let declared_failure = payload.get("success").and_then(Value::as_bool) == Some(false);

    if status_failed || declared_failure {
        let message = error_message(&payload).unwrap_or_else(|| body.to_string());
        if is_auth_failure(status, &message) {
            return RemoteOutcome::AuthInvalid(status);
        }
        return RemoteOutcome::Failure(format!("HTTP {status}: {}", snippet(&message)));
    }

    RemoteOutcome::Ok(payload)
}

/// Authentication-failure heuristic: 401/403, or a message that mentions the
/// session, cookie or login (case-insensitive).
pub fn is_auth_failure(status: u16, text: &str) -> bool {
    if status == 401 || status == 403 {
        return true;
    }
    let lower = text.to_lowercase();
    AUTH_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Parse a `retry-after` value: integer seconds or an HTTP-date.
///
/// Dates in the past yield the floor. Returns None when the value is neither.
pub fn parse_retry_after(value: &str, now: SystemTime) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs).max(MIN_RATE_LIMIT_WAIT));
    }

    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let now: DateTime<Utc> = now.into();
    let millis = date
        .with_timezone(&Utc)
        .signed_duration_since(now)
        .num_milliseconds()
        .max(0) as u64;
    Some(Duration::from_millis(millis).max(MIN_RATE_LIMIT_WAIT))
}

/// Error text from a parsed payload: `message`, then `error` (string or object).
fn error_message(payload: &Value) -> Option<String> {
    if let Some(message) = payload.get("message").and_then(Value::as_str) {
        return Some(message.to_owned());
    }
    match payload.get("error") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(obj)) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => None,
    }
}

fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= SNIPPET_LEN {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(SNIPPET_LEN).collect();
    format!("{cut}...")
}
