//! Signed session tokens (HS256 JWT).
//!
//! The token is the only durable session state: it lives in the
//! `session_token` cookie and the session projection is rebuilt from it on
//! every request.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::Token;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token encode failed: {0}")]
    Encode(jsonwebtoken::errors::Error),
    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

/// Encodes and verifies session tokens with one shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    max_age: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &str, max_age: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            max_age,
        }
    }

    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Stamp `iat`/`exp` relative to now and sign.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encode`] if serialization or signing fails.
    pub fn issue(&self, token: Token) -> Result<String, TokenError> {
        self.issue_at(token, unix_now())
    }

    pub(crate) fn issue_at(&self, mut token: Token, now: i64) -> Result<String, TokenError> {
        let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        token.iat = Some(now);
        token.exp = Some(now.saturating_add(max_age));
        self.encode(&token)
    }

    /// Sign the token as-is.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encode`] if serialization or signing fails.
    pub fn encode(&self, token: &Token) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), token, &self.encoding).map_err(TokenError::Encode)
    }

    /// Verify signature and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Invalid`] for malformed, tampered, or expired tokens.
    pub fn decode(&self, jwt: &str) -> Result<Token, TokenError> {
        jsonwebtoken::decode::<Token>(jwt, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;
