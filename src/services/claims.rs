//! Session claims resolver: token derivation, session projection, and the
//! authorization gate.
//!
//! ARCHITECTURE
//! ============
//! Sign-in runs [`derive_token_claims`] once with the provider profile; every
//! later request decodes the signed token and runs [`derive_session`] with no
//! profile. The gate ([`authorized`]) only looks at the derived session.
//!
//! Field fallbacks (avatar source, user id source) are ordered candidate
//! lists so the priority is visible in one place and testable on its own.
//!
//! TRADE-OFFS
//! ==========
//! Tokens that never went through the sign-in branch (issued before the id
//! claim existed) fall back to the email as the user id. Kept for
//! compatibility with sessions already in the wild.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Id used when a token carries neither an `id` nor an `email` claim.
/// Keeps `user.id` non-empty.
pub const MISSING_CLAIM: &str = "undefined";

// =============================================================================
// DATA MODEL
// =============================================================================

/// Provider user identifiers arrive as strings (Google) or integers (GitHub).
/// Any other JSON scalar is kept verbatim and displayed as its JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimId {
    Text(String),
    Number(i64),
    Other(serde_json::Value),
}

impl ClaimId {
    fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for ClaimId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Raw identity-provider profile. Untrusted; only present at sign-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<ClaimId>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Signed token claims. `id` and `image` are written once per sign-in and
/// carried forward unchanged on every refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ClaimId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Issued-at (Unix timestamp, seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiry (Unix timestamp, seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// User half of the session projection.
///
/// Only `id`, `name`, `email`, `image` are filled here. The remaining fields
/// belong to other parts of the chat application and are always `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_container: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_webserver: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
}

/// Per-request projection of a token. Never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: Option<SessionUser>,
    /// Token expiry as RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
}

impl Session {
    /// Session shell built from a token before [`derive_session`] runs.
    #[must_use]
    pub fn shell(token: &Token) -> Self {
        let user = SessionUser {
            name: token.name.clone(),
            email: token.email.clone(),
            image: first_present(&TOKEN_IMAGE_SOURCES, token).map(str::to_owned),
            ..SessionUser::default()
        };
        let expires = token
            .exp
            .and_then(|exp| OffsetDateTime::from_unix_timestamp(exp).ok())
            .and_then(|at| at.format(&Rfc3339).ok());
        Self { user: Some(user), expires }
    }
}

// =============================================================================
// CANDIDATE SOURCES
// =============================================================================

type Source<T> = fn(&T) -> Option<&str>;

fn profile_avatar_url(p: &Profile) -> Option<&str> {
    p.avatar_url.as_deref()
}

fn profile_picture(p: &Profile) -> Option<&str> {
    p.picture.as_deref()
}

fn token_image(t: &Token) -> Option<&str> {
    t.image.as_deref()
}

fn token_picture(t: &Token) -> Option<&str> {
    t.picture.as_deref()
}

/// Avatar fields on a provider profile, highest priority first.
const PROFILE_IMAGE_SOURCES: [Source<Profile>; 2] = [profile_avatar_url, profile_picture];

/// Avatar claims on a token, highest priority first.
const TOKEN_IMAGE_SOURCES: [Source<Token>; 2] = [token_image, token_picture];

/// First non-empty value among `sources`, evaluated in order.
fn first_present<'a, T>(sources: &[Source<T>], value: &'a T) -> Option<&'a str> {
    sources
        .iter()
        .find_map(|source| source(value).filter(|s| !s.is_empty()))
}

/// Session user id sources, highest priority first: the stable `id` claim,
/// then the email for tokens minted without one.
fn session_id_candidates(token: &Token) -> [Option<String>; 2] {
    [
        token.id.as_ref().filter(|id| !id.is_blank()).map(ToString::to_string),
        token.email.clone().filter(|e| !e.is_empty()),
    ]
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Default claims for a freshly signed-in user, before [`derive_token_claims`].
#[must_use]
pub fn seed_token(profile: &Profile) -> Token {
    let sub = profile
        .id
        .as_ref()
        .map(ToString::to_string)
        .or_else(|| profile.sub.clone());
    Token {
        sub,
        name: profile.name.clone(),
        email: profile.email.clone(),
        picture: profile.picture.clone(),
        ..Token::default()
    }
}

/// Token step. With a profile (initial sign-in) copies the provider id and
/// the first available avatar onto the token; without one (refresh) the
/// token is returned untouched.
#[must_use]
pub fn derive_token_claims(mut token: Token, profile: Option<&Profile>) -> Token {
    let Some(profile) = profile else {
        return token;
    };
    token.id.clone_from(&profile.id);
    token.image = first_present(&PROFILE_IMAGE_SOURCES, profile).map(str::to_owned);
    token
}

/// Session step. Runs on every session read.
#[must_use]
pub fn derive_session(mut session: Session, token: &Token) -> Session {
    if let Some(user) = session.user.as_mut() {
        user.id = session_id_candidates(token)
            .into_iter()
            .flatten()
            .next()
            .unwrap_or_else(|| MISSING_CLAIM.to_owned());
    }
    session
}

/// Decode-side convenience: shell plus session step.
#[must_use]
pub fn session_from_token(token: &Token) -> Session {
    derive_session(Session::shell(token), token)
}

/// Authorization gate: true iff the auth context carries a user.
#[must_use]
pub fn authorized(auth: Option<&Session>) -> bool {
    auth.is_some_and(|session| session.user.is_some())
}

#[cfg(test)]
#[path = "claims_test.rs"]
mod tests;
