//! OAuth anti-forgery state
//!
//! Each login gets a fresh random `state`. It travels to GitHub in the
//! authorization URL and back to us in an HMAC-signed cookie:
//!
//! ```text
//! oauth_state = {state}.{expires_unix}.{base64(hmac_sha256(state.expires_unix))}
//! ```
//!
//! The callback only proceeds when the cookie verifies, has not
//! expired, and carries the same `state` as the query string.

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Cookie carrying the signed state between `/login` and `/callback`
pub const STATE_COOKIE: &str = "oauth_state";

/// How long a user has to complete the provider round trip
pub const STATE_TTL_MINUTES: i64 = 10;

/// Generate a random, URL-safe state value
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Build the signed cookie value for `state`
pub fn sign_state(state: &str, expires_at: DateTime<Utc>, secret: &[u8]) -> Result<String, AppError> {
    let payload = format!("{}.{}", state, expires_at.timestamp());
    let signature = general_purpose::URL_SAFE_NO_PAD.encode(mac(secret, &payload)?.finalize().into_bytes());
    Ok(format!("{}.{}", payload, signature))
}

/// Sign `state` with the default lifetime
pub fn sign_state_now(state: &str, secret: &[u8]) -> Result<String, AppError> {
    sign_state(state, Utc::now() + Duration::minutes(STATE_TTL_MINUTES), secret)
}

/// Check a cookie value against the `state` returned by the provider
///
/// # Errors
/// `InvalidState` if the cookie is malformed, forged, expired, or
/// belongs to a different login attempt
pub fn verify_state(cookie_value: &str, returned_state: &str, secret: &[u8]) -> Result<(), AppError> {
    let parts: Vec<&str> = cookie_value.split('.').collect();
    if parts.len() != 3 {
        return Err(AppError::InvalidState);
    }
    let (state, expires, signature_b64) = (parts[0], parts[1], parts[2]);

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::InvalidState)?;
    mac(secret, &format!("{}.{}", state, expires))?
        .verify_slice(&signature)
        .map_err(|_| AppError::InvalidState)?;

    let expires: i64 = expires.parse().map_err(|_| AppError::InvalidState)?;
    if expires < Utc::now().timestamp() {
        return Err(AppError::InvalidState);
    }

    // The state itself is public; compare through the MAC to stay constant time.
    mac(secret, state)?
        .verify_slice(&mac(secret, returned_state)?.finalize().into_bytes())
        .map_err(|_| AppError::InvalidState)
}

fn mac(secret: &[u8], payload: &str) -> Result<HmacSha256, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid HMAC key: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(mac)
}
