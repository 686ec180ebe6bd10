use super::*;

fn config() -> GoogleConfig {
    GoogleConfig {
        client_id: "my_client_id".into(),
        client_secret: "secret".into(),
        redirect_uri: "http://localhost:3000/api/auth/callback/google".into(),
    }
}

// =============================================================================
// build_authorize_url
// =============================================================================

#[test]
fn authorize_url_starts_with_google() {
    let url = build_authorize_url(&config(), "st", "ch");
    assert!(url.starts_with(GOOGLE_AUTHORIZE_URL));
}

#[test]
fn authorize_url_contains_client_id() {
    let url = build_authorize_url(&config(), "st", "ch");
    assert!(url.contains("client_id=my_client_id"));
}

#[test]
fn authorize_url_encodes_redirect_uri() {
    let url = build_authorize_url(&config(), "st", "ch");
    assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fcallback%2Fgoogle"));
}

#[test]
fn authorize_url_contains_state_and_pkce() {
    let url = build_authorize_url(&config(), "csrf_token_abc", "challenge_xyz");
    assert!(url.contains("state=csrf_token_abc"));
    assert!(url.contains("code_challenge=challenge_xyz"));
    assert!(url.contains("code_challenge_method=S256"));
}

#[test]
fn authorize_url_requests_code_and_forces_prompt() {
    let url = build_authorize_url(&config(), "st", "ch");
    assert!(url.contains("response_type=code"));
    assert!(url.contains("prompt=select_account"));
    assert!(!url.contains("prompt=login"));
    assert!(url.contains("scope=openid+email+profile"));
}

#[test]
fn provider_delegates_authorize_url() {
    let provider = GoogleProvider::new(config(), reqwest::Client::new());
    assert_eq!(provider.id(), "google");
    assert_eq!(provider.authorize_url("a", "b"), build_authorize_url(&config(), "a", "b"));
}

// =============================================================================
// PKCE
// =============================================================================

#[test]
fn code_challenge_matches_rfc7636_vector() {
    assert_eq!(
        code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );
}

#[test]
fn code_verifier_is_43_urlsafe_chars() {
    let verifier = generate_code_verifier();
    assert_eq!(verifier.len(), 43);
    assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
}

#[test]
fn code_verifier_two_calls_differ() {
    assert_ne!(generate_code_verifier(), generate_code_verifier());
}

// =============================================================================
// AuthError display
// =============================================================================

#[test]
fn auth_error_token_exchange_display() {
    let err = AuthError::TokenExchange("timeout".into());
    let msg = err.to_string();
    assert!(msg.contains("token exchange"));
    assert!(msg.contains("timeout"));
}

#[test]
fn auth_error_provider_api_display() {
    let err = AuthError::ProviderApi("403 Forbidden".into());
    let msg = err.to_string();
    assert!(msg.contains("provider api"));
    assert!(msg.contains("403 Forbidden"));
}

// =============================================================================
// TokenResponse serde
// =============================================================================

#[test]
fn token_response_ignores_extra_fields() {
    let json = r#"{"access_token":"ya29.x","expires_in":3599,"token_type":"Bearer","id_token":"e.y.z"}"#;
    let resp: TokenResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.access_token, "ya29.x");
}
