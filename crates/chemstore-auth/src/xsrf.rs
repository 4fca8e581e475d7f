//! Anti-forgery tokens.
//!
//! A token binds a subject (the user id, or the nil uuid for anonymous
//! callers) to an action (the request path) at an issue time:
//!
//! ```text
//! base64url( HMAC-SHA256(key, user ":" action ":" millis) ":" millis )
//! ```
//!
//! Backslashes and colons in the user and action are escaped before signing so
//! the fields cannot be shifted into each other. Tokens stay valid for
//! [`XSRF_TIMEOUT_MILLIS`] and tolerate one minute of clock skew into the
//! future.

use chrono::Utc;
use data_encoding::BASE64URL_NOPAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Request header carrying the anti-forgery token.
pub const XSRF_HEADER: &str = "_xsrf";

/// Token lifetime.
pub const XSRF_TIMEOUT_MILLIS: i64 = 24 * 60 * 60 * 1000;

const FUTURE_SKEW_MILLIS: i64 = 60 * 1000;

type HmacSha256 = Hmac<Sha256>;

/// Generates a token for `user_id` performing `action`, issued now.
pub fn generate(key: &str, user_id: &str, action: &str) -> String {
    generate_at(key, user_id, action, Utc::now().timestamp_millis())
}

pub fn generate_at(key: &str, user_id: &str, action: &str, now_millis: i64) -> String {
    let mut raw = signature(key, user_id, action, now_millis);
    raw.push(b':');
    raw.extend_from_slice(now_millis.to_string().as_bytes());
    BASE64URL_NOPAD.encode(&raw)
}

/// Checks `token` against `user_id` and `action`.
pub fn valid(token: &str, key: &str, user_id: &str, action: &str) -> bool {
    valid_at(token, key, user_id, action, Utc::now().timestamp_millis())
}

pub fn valid_at(token: &str, key: &str, user_id: &str, action: &str, now_millis: i64) -> bool {
    let Ok(raw) = BASE64URL_NOPAD.decode(token.as_bytes()) else {
        return false;
    };
    let Some(sep) = raw.iter().rposition(|b| *b == b':') else {
        return false;
    };
    let (mac, issued) = (&raw[..sep], &raw[sep + 1..]);

    let Some(issued) = std::str::from_utf8(issued)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
    else {
        return false;
    };

    // The issue time is client input; any overflow is a rejection.
    match now_millis.checked_sub(issued) {
        Some(age) if age < XSRF_TIMEOUT_MILLIS && age >= -FUTURE_SKEW_MILLIS => {}
        _ => return false,
    }

    mac_for(key, user_id, action, issued)
        .map(|m| m.verify_slice(mac).is_ok())
        .unwrap_or(false)
}

fn signature(key: &str, user_id: &str, action: &str, millis: i64) -> Vec<u8> {
    mac_for(key, user_id, action, millis)
        .map(|m| m.finalize().into_bytes().to_vec())
        .unwrap_or_default()
}

fn mac_for(key: &str, user_id: &str, action: &str, millis: i64) -> Option<HmacSha256> {
    // HMAC accepts keys of any length; this only fails on a broken backend.
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).ok()?;
    mac.update(format!("{}:{}:{}", clean(user_id), clean(action), millis).as_bytes());
    Some(mac)
}

fn clean(s: &str) -> String {
    s.replace('\\', "\\\\").replace(':', "\\:")
}
