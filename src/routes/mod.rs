//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Public routes (auth endpoints, sign-in page, health) are merged with a
//! protected router whose every route sits behind the authorization gate.

pub mod auth;
pub mod pages;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Routes that require a signed-in user.
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route_layer(middleware::from_fn_with_state(state, auth::require_auth))
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/signin/{provider}", get(auth::sign_in))
        .route("/api/auth/callback/{provider}", get(auth::callback))
        .route("/api/auth/session", get(auth::session_json))
        .route("/api/auth/signout", post(auth::sign_out))
        .route(&state.config.sign_in_page, get(pages::sign_in_page))
        .route("/healthz", get(healthz))
        .merge(protected_routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
