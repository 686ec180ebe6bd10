//! Auth configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Resolved exactly once in `main` and handed to handlers through
//! `AppState`. Nothing reads the environment after startup.

use std::time::Duration;

pub const DEFAULT_AUTH_URL: &str = "http://localhost:3000";
pub const DEFAULT_SIGN_IN_PAGE: &str = "/sign-in";
pub const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;
pub const DEFAULT_PORT: u16 = 3000;

/// Path the provider redirects back to after consent.
pub const CALLBACK_PATH: &str = "/api/auth/callback/google";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Google OAuth client credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub google: GoogleConfig,
    /// HS256 signing secret for session tokens.
    pub secret: String,
    /// Public base URL, without trailing slash.
    pub base_url: String,
    /// Custom sign-in page the authorization gate redirects to.
    pub sign_in_page: String,
    pub session_max_age: Duration,
    pub cookie_secure: bool,
    pub port: u16,
}

impl AuthConfig {
    /// Build typed auth config from environment variables.
    ///
    /// Required:
    /// - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`
    /// - `AUTH_SECRET`
    ///
    /// Optional:
    /// - `AUTH_URL`: default `http://localhost:3000`
    /// - `AUTH_SIGN_IN_PAGE`: default `/sign-in`
    /// - `SESSION_MAX_AGE_SECS`: default 30 days
    /// - `COOKIE_SECURE`: inferred from the `AUTH_URL` scheme when absent
    /// - `PORT`: default 3000
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for absent required vars and
    /// [`ConfigError::Invalid`] for values that fail to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. `from_env` delegates here
    /// so parsing can be exercised without touching the process environment.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let client_id = required("GOOGLE_CLIENT_ID")?;
        let client_secret = required("GOOGLE_CLIENT_SECRET")?;
        let secret = required("AUTH_SECRET")?;

        let base_url = lookup("AUTH_URL")
            .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let sign_in_page = parse_sign_in_page(lookup("AUTH_SIGN_IN_PAGE").as_deref())?;

        let max_age_secs = parse_number("SESSION_MAX_AGE_SECS", lookup("SESSION_MAX_AGE_SECS"))?
            .unwrap_or(DEFAULT_SESSION_MAX_AGE_SECS);
        let port = parse_number("PORT", lookup("PORT"))?.unwrap_or(DEFAULT_PORT);

        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "COOKIE_SECURE",
                reason: format!("expected a boolean, got {raw:?}"),
            })?,
            None => base_url.starts_with("https://"),
        };

        let redirect_uri = format!("{base_url}{CALLBACK_PATH}");

        Ok(Self {
            google: GoogleConfig { client_id, client_secret, redirect_uri },
            secret,
            base_url,
            sign_in_page,
            session_max_age: Duration::from_secs(max_age_secs),
            cookie_secure,
            port,
        })
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.map(|v| {
        v.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::Invalid { var, reason: e.to_string() })
    })
    .transpose()
}

/// Paths the router already serves; the sign-in page may not shadow them.
const RESERVED_PATHS: [&str; 2] = ["/", "/healthz"];
const RESERVED_PREFIX: &str = "/api/auth";

fn parse_sign_in_page(raw: Option<&str>) -> Result<String, ConfigError> {
    let page = raw.map_or(DEFAULT_SIGN_IN_PAGE, str::trim);
    let invalid = |reason: String| ConfigError::Invalid { var: "AUTH_SIGN_IN_PAGE", reason };

    if !page.starts_with('/') {
        return Err(invalid(format!("must be an absolute path, got {page:?}")));
    }
    if RESERVED_PATHS.contains(&page) || page == RESERVED_PREFIX || page.starts_with(&format!("{RESERVED_PREFIX}/")) {
        return Err(invalid(format!("{page:?} collides with a built-in route")));
    }
    if page.contains(['{', '}', '?', '#']) || page.chars().any(char::is_whitespace) {
        return Err(invalid(format!("must be a literal path, got {page:?}")));
    }
    Ok(page.to_string())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
