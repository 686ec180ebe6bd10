//! Server-rendered pages: the custom sign-in page and the protected home.
//!
//! Markup is intentionally bare; the chat UI is served elsewhere.

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::auth::{AuthSession, current_session, safe_callback_url};
use crate::state::AppState;

pub(crate) fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Deserialize)]
pub struct SignInPageQuery {
    #[serde(rename = "callbackUrl")]
    callback_url: Option<String>,
    error: Option<String>,
}

/// Sign-in page. Visitors who already hold a session go straight home.
pub async fn sign_in_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<SignInPageQuery>,
) -> Response {
    if current_session(&state, &jar).is_some_and(|s| s.user.is_some()) {
        return Redirect::temporary("/").into_response();
    }

    let callback_url = params
        .callback_url
        .as_deref()
        .and_then(safe_callback_url)
        .unwrap_or("/");
    let href = reqwest::Url::parse_with_params(
        &format!("{}/api/auth/signin/{}", state.config.base_url, state.provider.id()),
        &[("callbackUrl", callback_url)],
    )
    .map(String::from)
    .unwrap_or_else(|_| format!("/api/auth/signin/{}", state.provider.id()));

    let notice = if params.error.is_some() {
        "<p role=\"alert\">Sign-in failed. Please try again.</p>"
    } else {
        ""
    };

    Html(format!(
        "<!doctype html>\n<html><head><title>Sign in</title></head><body>\
         <h1>Sign in to continue your conversations</h1>{notice}\
         <a href=\"{}\">Continue with Google</a>\
         </body></html>",
        escape_html(&href)
    ))
    .into_response()
}

/// Protected home. Only reachable through the authorization gate.
pub async fn home(AuthSession(session): AuthSession) -> Html<String> {
    let id = session.user.map(|u| u.id).unwrap_or_default();
    Html(format!(
        "<!doctype html>\n<html><head><title>Chat</title></head><body>\
         <p>Signed in as {}</p>\
         </body></html>",
        escape_html(&id)
    ))
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
