use axum::body::{Body, to_bytes};
use axum::http::{Request, header};
use tower::ServiceExt;

use super::*;
use crate::services::claims::Profile;
use crate::state::test_helpers::{default_test_state, session_cookie_for};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn healthz_ok() {
    let resp = app(default_test_state()).oneshot(get("/healthz")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn home_redirects_anonymous_to_sign_in() {
    let resp = app(default_test_state()).oneshot(get("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = resp.headers()[header::LOCATION].to_str().unwrap();
    assert_eq!(location, "http://localhost:3000/sign-in?callbackUrl=%2F");
}

#[tokio::test]
async fn home_keeps_query_in_callback_url() {
    let resp = app(default_test_state()).oneshot(get("/?chat=42")).await.unwrap();
    let location = resp.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.ends_with("callbackUrl=%2F%3Fchat%3D42"));
}

#[tokio::test]
async fn home_rejects_invalid_cookie() {
    let resp = app(default_test_state())
        .oneshot(get_with_cookie("/", "session_token=forged.token.value"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn home_serves_signed_in_user() {
    let state = default_test_state();
    let jwt = session_cookie_for(&state, &Profile { id: Some("u7".into()), ..Profile::default() });
    let resp = app(state)
        .oneshot(get_with_cookie("/", &format!("session_token={jwt}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("Signed in as u7"));
}

#[tokio::test]
async fn sign_in_page_mounted_at_configured_path() {
    let resp = app(default_test_state()).oneshot(get("/sign-in")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn sign_in_page_mounted_at_custom_path() {
    let mut config = crate::state::test_helpers::test_config();
    config.sign_in_page = "/login".into();
    let state = crate::state::AppState::new(config, default_test_state().provider);

    let router = app(state);
    let resp = router.clone().oneshot(get("/login")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router.oneshot(get("/")).await.unwrap();
    let location = resp.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("http://localhost:3000/login?"));
}
