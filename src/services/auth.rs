//! Google OAuth service — authorization URL, PKCE, code exchange, profile fetch.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

use super::claims::Profile;
use crate::config::GoogleConfig;

pub const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token exchange failed: {0}")]
    TokenExchange(String),
    #[error("provider api error: {0}")]
    ProviderApi(String),
}

#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Identity provider seam used by the sign-in routes.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider id used in route paths (`/api/auth/signin/{id}`).
    fn id(&self) -> &'static str;

    /// Build the consent-screen URL for a sign-in attempt.
    fn authorize_url(&self, state: &str, code_challenge: &str) -> String;

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenExchange`] on transport failure or an
    /// unexpected response body.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<String, AuthError>;

    /// Fetch the raw profile of the user behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ProviderApi`] on transport failure or a non-2xx status.
    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, AuthError>;
}

pub struct GoogleProvider {
    config: GoogleConfig,
    http: reqwest::Client,
}

impl GoogleProvider {
    #[must_use]
    pub fn new(config: GoogleConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for GoogleProvider {
    fn id(&self) -> &'static str {
        "google"
    }

    fn authorize_url(&self, state: &str, code_challenge: &str) -> String {
        build_authorize_url(&self.config, state, code_challenge)
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<String, AuthError> {
        let resp = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("code_verifier", code_verifier),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;
        let token_resp: TokenResponse =
            serde_json::from_str(&body).map_err(|_| AuthError::TokenExchange(format!("unexpected response: {body}")))?;
        Ok(token_resp.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, AuthError> {
        let resp = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::ProviderApi(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::ProviderApi(format!("{status}: {body}")));
        }

        resp.json::<Profile>()
            .await
            .map_err(|e| AuthError::ProviderApi(e.to_string()))
    }
}

/// Consent-screen URL. `prompt=select_account` forces the account chooser on every
/// sign-in.
#[must_use]
pub fn build_authorize_url(config: &GoogleConfig, state: &str, code_challenge: &str) -> String {
    let params = [
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("response_type", "code"),
        ("scope", "openid email profile"),
        ("prompt", "select_account"),
        ("state", state),
        ("code_challenge", code_challenge),
        ("code_challenge_method", "S256"),
    ];
    reqwest::Url::parse_with_params(GOOGLE_AUTHORIZE_URL, &params)
        .map(String::from)
        .unwrap_or_else(|_| GOOGLE_AUTHORIZE_URL.to_owned())
}

// =============================================================================
// PKCE
// =============================================================================

/// Random PKCE code verifier (43 base64url chars).
#[must_use]
pub fn generate_code_verifier() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// S256 code challenge for `verifier`.
#[must_use]
pub fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
