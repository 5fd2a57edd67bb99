//! Request descriptions for the remote API

use std::fmt::Write;

use reqwest::Method;
use serde_json::json;

use crate::constants::{IDENTITY_PATH, LOOTBOXES_PATH, TASKS_PATH, TOKENS_PATH};

/// A single remote call, independent of the credential it is sent with.
///
/// Requests are plain data so the retry policy can resend the same call
/// after a credential refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }

    /// Lightweight session check used by the credential guard.
    pub fn identity() -> Self {
        Self::get(IDENTITY_PATH)
    }

    pub fn list_tasks() -> Self {
        Self::get(TASKS_PATH)
    }

    pub fn complete_task(task_id: &str) -> Self {
        Self::post(format!("{TASKS_PATH}/{}/complete", encode_segment(task_id)), json!({}))
    }

    pub fn create_token() -> Self {
        Self::post(TOKENS_PATH, json!({}))
    }

    pub fn list_lootboxes() -> Self {
        Self::get(LOOTBOXES_PATH)
    }

    pub fn open_lootbox(lootbox_id: &str) -> Self {
        Self::post(
            format!("{LOOTBOXES_PATH}/{}/open", encode_segment(lootbox_id)),
            json!({ "quantity": 1 }),
        )
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}
