//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the auth configuration resolved at startup, the token codec built
//! from it, and the identity provider. Nothing in it is mutated after
//! construction.

use std::sync::Arc;

use crate::config::AuthConfig;
use crate::services::auth::{GoogleProvider, IdentityProvider};
use crate::services::token::TokenCodec;

/// Clone is required by Axum — all inner fields are Arc-wrapped or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AuthConfig>,
    pub tokens: TokenCodec,
    pub provider: Arc<dyn IdentityProvider>,
}

impl AppState {
    #[must_use]
    pub fn new(config: AuthConfig, provider: Arc<dyn IdentityProvider>) -> Self {
        let tokens = TokenCodec::new(&config.secret, config.session_max_age);
        Self { config: Arc::new(config), tokens, provider }
    }

    /// Wire the Google provider with a shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_google(config: AuthConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let provider = GoogleProvider::new(config.google.clone(), http);
        Ok(Self::new(config, Arc::new(provider)))
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;
