//! Auth routes — Google OAuth flow, session read, sign-out, authorization gate.

use axum::extract::{FromRef, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;

use crate::services::claims::{self, Session};
use crate::services::{auth as auth_svc, session};
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";
pub(crate) const OAUTH_STATE_COOKIE_NAME: &str = "oauth_state";
pub(crate) const PKCE_COOKIE_NAME: &str = "oauth_pkce";
pub(crate) const CALLBACK_URL_COOKIE_NAME: &str = "callback_url";

/// Lifetime of the transient sign-in cookies.
const SIGN_IN_COOKIE_MINUTES: i64 = 10;

fn build_cookie(name: &'static str, value: String, secure: bool, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

fn clear_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    build_cookie(name, String::new(), secure, Duration::ZERO)
}

/// Only same-origin absolute paths are accepted as post-sign-in targets.
pub(crate) fn safe_callback_url(raw: &str) -> Option<&str> {
    let ok = raw.starts_with('/') && !raw.starts_with("//") && !raw.contains('\\');
    ok.then_some(raw)
}

/// Session projection for the request's cookies, if any.
#[must_use]
pub fn current_session(state: &AppState, jar: &CookieJar) -> Option<Session> {
    let jwt = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
    session::resolve_session(&state.tokens, jwt)
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated session. Use as a handler parameter to require a user.
///
/// Reuses the session the gate middleware already derived when present.
pub struct AuthSession(pub Session);

impl<S> axum::extract::FromRequestParts<S> for AuthSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = match parts.extensions.get::<Session>() {
            Some(session) => Some(session.clone()),
            None => {
                let app_state = AppState::from_ref(state);
                current_session(&app_state, &CookieJar::from_headers(&parts.headers))
            }
        };

        match session {
            Some(session) if claims::authorized(Some(&session)) => Ok(Self(session)),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }
}

// =============================================================================
// AUTHORIZATION GATE
// =============================================================================

/// Middleware guarding every route it wraps. Anonymous requests are sent to
/// the sign-in page with the original path as `callbackUrl`; authorized ones
/// continue with the session stored as a request extension.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let session = current_session(&state, &CookieJar::from_headers(req.headers()));

    if !claims::authorized(session.as_ref()) {
        let target = req
            .uri()
            .path_and_query()
            .map_or("/", |pq| pq.as_str())
            .to_owned();
        tracing::debug!(path = %target, "unauthenticated request, redirecting to sign-in");
        return Redirect::temporary(&sign_in_redirect(&state, &target, None)).into_response();
    }

    if let Some(session) = session {
        req.extensions_mut().insert(session);
    }
    next.run(req).await
}

/// Absolute URL of the sign-in page carrying `callbackUrl` and an optional
/// error code.
pub(crate) fn sign_in_redirect(state: &AppState, callback_url: &str, error: Option<&str>) -> String {
    let page = format!("{}{}", state.config.base_url, state.config.sign_in_page);
    let Ok(mut url) = reqwest::Url::parse(&page) else {
        return state.config.sign_in_page.clone();
    };
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("callbackUrl", callback_url);
        if let Some(error) = error {
            query.append_pair("error", error);
        }
    }
    url.into()
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct SignInQuery {
    #[serde(rename = "callbackUrl")]
    callback_url: Option<String>,
}

/// `GET /api/auth/signin/{provider}` — redirect to the provider consent page.
pub async fn sign_in(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<SignInQuery>,
) -> Response {
    if provider != state.provider.id() {
        return (StatusCode::NOT_FOUND, "unknown provider").into_response();
    }

    let oauth_state = session::generate_state();
    let verifier = auth_svc::generate_code_verifier();
    let challenge = auth_svc::code_challenge(&verifier);
    let secure = state.config.cookie_secure;
    let ttl = Duration::minutes(SIGN_IN_COOKIE_MINUTES);

    let mut jar = CookieJar::new()
        .add(build_cookie(OAUTH_STATE_COOKIE_NAME, oauth_state.clone(), secure, ttl))
        .add(build_cookie(PKCE_COOKIE_NAME, verifier, secure, ttl));
    if let Some(callback_url) = params.callback_url.as_deref().and_then(safe_callback_url) {
        jar = jar.add(build_cookie(CALLBACK_URL_COOKIE_NAME, callback_url.to_owned(), secure, ttl));
    }

    let url = state.provider.authorize_url(&oauth_state, &challenge);
    (jar, Redirect::temporary(&url)).into_response()
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// `GET /api/auth/callback/{provider}` — exchange code, fetch profile, derive
/// token claims, set the session cookie and redirect to the callback URL.
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Response {
    if provider != state.provider.id() {
        return (StatusCode::NOT_FOUND, "unknown provider").into_response();
    }
    let secure = state.config.cookie_secure;

    if let Some(error) = params.error.as_deref() {
        tracing::warn!(%provider, %error, "provider returned an error");
        return abort_sign_in(&state, jar);
    }
    let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
        return abort_sign_in(&state, jar);
    };

    // Verify OAuth CSRF state from cookie.
    let Some(callback_state) = params.state.as_deref() else {
        return (StatusCode::BAD_REQUEST, "missing oauth state").into_response();
    };
    let expected_state = jar
        .get(OAUTH_STATE_COOKIE_NAME)
        .map(Cookie::value)
        .unwrap_or_default();
    if expected_state.is_empty() || expected_state != callback_state {
        return (StatusCode::UNAUTHORIZED, "invalid oauth state").into_response();
    }
    let verifier = jar.get(PKCE_COOKIE_NAME).map(Cookie::value).unwrap_or_default();
    if verifier.is_empty() {
        return (StatusCode::UNAUTHORIZED, "missing pkce verifier").into_response();
    }

    // Exchange code for access token.
    let access_token = match state.provider.exchange_code(code, verifier).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "oauth code exchange failed");
            return (StatusCode::BAD_GATEWAY, "OAuth code exchange failed").into_response();
        }
    };

    // Fetch provider profile.
    let profile = match state.provider.fetch_profile(&access_token).await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "profile fetch failed");
            return (StatusCode::BAD_GATEWAY, "Failed to fetch profile").into_response();
        }
    };

    // Token step with the profile present, then sign.
    let token = match session::issue_for_profile(&state.tokens, &profile) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "session token issue failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session").into_response();
        }
    };
    tracing::info!(%provider, has_id = profile.id.is_some(), "user signed in");

    let target = remembered_callback_url(&jar);

    let max_age = Duration::seconds(i64::try_from(state.tokens.max_age().as_secs()).unwrap_or(i64::MAX));
    let jar = clear_sign_in_cookies(jar, secure).add(build_cookie(COOKIE_NAME, token, secure, max_age));
    (jar, Redirect::temporary(&target)).into_response()
}

/// Post-sign-in target stored by [`sign_in`], or `/`.
fn remembered_callback_url(jar: &CookieJar) -> String {
    jar.get(CALLBACK_URL_COOKIE_NAME)
        .map(Cookie::value)
        .and_then(safe_callback_url)
        .unwrap_or("/")
        .to_owned()
}

fn clear_sign_in_cookies(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(clear_cookie(OAUTH_STATE_COOKIE_NAME, secure))
        .add(clear_cookie(PKCE_COOKIE_NAME, secure))
        .add(clear_cookie(CALLBACK_URL_COOKIE_NAME, secure))
}

/// Send a failed sign-in attempt back to the sign-in page, keeping the
/// original target and dropping the attempt's transient cookies.
fn abort_sign_in(state: &AppState, jar: CookieJar) -> Response {
    let target = remembered_callback_url(&jar);
    let jar = clear_sign_in_cookies(jar, state.config.cookie_secure);
    let location = sign_in_redirect(state, &target, Some("OAuthCallback"));
    (jar, Redirect::temporary(&location)).into_response()
}

/// `GET /api/auth/session` — current session, or `null` when anonymous.
pub async fn session_json(State(state): State<AppState>, jar: CookieJar) -> Json<Option<Session>> {
    Json(current_session(&state, &jar))
}

/// `POST /api/auth/signout` — clear the session cookie.
pub async fn sign_out(State(state): State<AppState>) -> impl IntoResponse {
    let jar = CookieJar::new().add(clear_cookie(COOKIE_NAME, state.config.cookie_secure));
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
