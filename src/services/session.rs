//! Session resolution and sign-in state tokens.
//!
//! ARCHITECTURE
//! ============
//! Sessions are stateless: the signed token in the session cookie is decoded
//! and projected on every request, nothing is looked up server-side.
//! Sign-in attempts carry a random `state` value in a short-lived cookie to
//! tie the provider callback to the browser that started it.
//!
//! TRADE-OFFS
//! ==========
//! Without server-side storage a token cannot be revoked before `exp`;
//! sign-out only clears the cookie.

use std::fmt::Write;

use rand::Rng;

use super::claims::{self, Profile, Session, Token};
use super::token::{TokenCodec, TokenError};

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex value for OAuth `state`.
#[must_use]
pub fn generate_state() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Run the token step for a fresh sign-in and sign the result.
///
/// # Errors
///
/// Returns [`TokenError::Encode`] if signing fails.
pub fn issue_for_profile(codec: &TokenCodec, profile: &Profile) -> Result<String, TokenError> {
    let token = claims::derive_token_claims(claims::seed_token(profile), Some(profile));
    codec.issue(token)
}

/// Decode a session cookie value into a token, treating any failure as
/// anonymous.
#[must_use]
pub fn decode_token(codec: &TokenCodec, jwt: &str) -> Option<Token> {
    if jwt.is_empty() {
        return None;
    }
    match codec.decode(jwt) {
        Ok(token) => Some(claims::derive_token_claims(token, None)),
        Err(e) => {
            tracing::debug!(error = %e, "discarding session cookie");
            None
        }
    }
}

/// Session projection for a session cookie value, if it holds a valid token.
#[must_use]
pub fn resolve_session(codec: &TokenCodec, jwt: &str) -> Option<Session> {
    decode_token(codec, jwt).map(|token| claims::session_from_token(&token))
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
