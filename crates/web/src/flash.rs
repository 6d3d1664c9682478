//! One-shot status messages carried across a redirect
//!
//! Messages are stored as a JSON list in a signed cookie, set by the handler
//! that redirects and removed by the page that renders them.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use s3desk_core::Error;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Name of the cookie holding pending messages
pub const FLASH_COOKIE: &str = "s3desk_flash";

/// Severity of a message, used as its CSS class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Danger,
}

impl Level {
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Danger => "danger",
        }
    }
}

/// A status message shown once on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub text: String,
}

impl Flash {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            text: text.into(),
        }
    }

    pub fn danger(text: impl Into<String>) -> Self {
        Self {
            level: Level::Danger,
            text: text.into(),
        }
    }

    /// Message for a failed action
    ///
    /// Validation errors are shown as-is; provider errors are prefixed with
    /// the action, e.g. `Copy failed: NoSuchKey`.
    pub fn failure(action: &str, err: &Error) -> Self {
        if err.is_validation() {
            return Self::danger(err.to_string());
        }
        let kind = err.storage_kind().map(|k| k.as_str()).unwrap_or("other");
        warn!(action, kind, error = %err, "operation failed");
        Self::danger(format!("{action} failed: {err}"))
    }
}

/// Pending messages in the jar, without consuming them
pub fn peek(jar: &SignedCookieJar) -> Vec<Flash> {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return Vec::new();
    };
    let Ok(json) = percent_decode_str(cookie.value()).decode_utf8() else {
        return Vec::new();
    };
    serde_json::from_str(&json).unwrap_or_default()
}

/// Append a message to the pending list
pub fn push(jar: SignedCookieJar, flash: Flash) -> SignedCookieJar {
    let mut messages = peek(&jar);
    messages.push(flash);
    let json = serde_json::to_string(&messages).unwrap_or_default();
    let value = utf8_percent_encode(&json, NON_ALPHANUMERIC).to_string();
    jar.add(
        Cookie::build((FLASH_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Read and clear the pending messages
pub fn take(jar: SignedCookieJar) -> (SignedCookieJar, Vec<Flash>) {
    let messages = peek(&jar);
    if messages.is_empty() {
        return (jar, messages);
    }
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), messages)
}
