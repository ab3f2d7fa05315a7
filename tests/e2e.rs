//! End-to-end scenarios against an in-process router, in-memory stores only.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::Algorithm;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};
use tower::ServiceExt;

use verifier_proxy::config::Config;
use verifier_proxy::keys::SigningKey;
use verifier_proxy::models::{
    Client, ClientDisplayMetadata, GrantType, ResponseType, SubjectType, TokenEndpointAuthMethod,
};
use verifier_proxy::oidc::{AppState, RequestObjectCache};
use verifier_proxy::presentation::{ClaimsExtractor, PresentationBuilder, SdJwtShapedParser};
use verifier_proxy::ratelimit::RateLimiter;
use verifier_proxy::routes::build_router;
use verifier_proxy::store::{InMemoryClientStore, InMemorySessionStore};

fn config(session_duration_secs: i64) -> Config {
    let config_str = format!(
        r#"
        external_url = "https://verifier.example.com"

        [oidc]
        issuer = "https://verifier.example.com"
        signing_key_path = "/dev/null"
        session_duration_secs = {session_duration_secs}
        code_duration_secs = 60
        access_token_duration_secs = 3600
        id_token_duration_secs = 3600
        refresh_token_duration_secs = 2592000
        subject_salt = "pepper"
        "#
    );
    Config::from_str(&config_str).unwrap()
}

fn test_signing_key() -> SigningKey {
    let mut rng = rand::thread_rng();
    let key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
    let pem = key.to_pkcs1_pem(rsa::pkcs1::LineEnding::LF).unwrap().to_string();
    let path = std::env::temp_dir().join(format!("e2e-test-{}.pem", uuid::Uuid::new_v4()));
    std::fs::write(&path, pem).unwrap();
    SigningKey::load(path.to_str().unwrap(), Algorithm::RS256).unwrap()
}

async fn test_state(config: Config) -> AppState {
    AppState {
        sessions: InMemorySessionStore::new(),
        clients: InMemoryClientStore::new(),
        signing_key: Arc::new(test_signing_key()),
        presentation_builder: Arc::new(PresentationBuilder::new(vec![], HashMap::new())),
        claims_extractor: Arc::new(ClaimsExtractor::new(SdJwtShapedParser)),
        request_object_cache: Arc::new(RequestObjectCache::default()),
        rate_limiter: RateLimiter::spawn(&config.limits, config.server.trusted_proxies.clone()),
        config: Arc::new(config),
    }
}

fn confidential_client(require_pkce: bool) -> Client {
    Client {
        client_id: "C1".into(),
        client_secret_hash: Some(verifier_proxy::keys::hash_client_secret("secret").unwrap()),
        redirect_uris: vec!["https://rp.example/cb".into()],
        grant_types: vec![GrantType::AuthorizationCode],
        response_types: vec![ResponseType::Code],
        token_endpoint_auth_method: TokenEndpointAuthMethod::ClientSecretPost,
        allowed_scopes: vec!["openid".into(), "pid".into()],
        default_scopes: vec!["openid".into()],
        subject_type: SubjectType::Pairwise,
        jwks: None,
        jwks_uri: None,
        require_pkce,
        code_challenge_required: require_pkce,
        display: ClientDisplayMetadata::default(),
        registration_access_token_hash: "unused".into(),
        client_secret_expires_at: 0,
        created_at: Utc::now(),
    }
}

fn vp_token_for(claims: Value) -> String {
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
    format!("header.{payload}.signature")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

fn extract_session_id_from_request_uri(html: &str) -> String {
    let needle = "/verification/request-object/";
    let start = html.find(needle).unwrap() + needle.len();
    let rest = &html[start..];
    let end = rest.find(['"', '&']).unwrap();
    rest[..end].to_string()
}

/// E1 — happy-path authorization code with PKCE (S256).
#[tokio::test]
async fn e1_happy_path_with_pkce() {
    let state = test_state(config(300)).await;
    state.clients.create(confidential_client(true)).await.unwrap();
    let app = build_router(state);

    let authorize_uri = "/authorize?response_type=code&client_id=C1&redirect_uri=https://rp.example/cb\
        &scope=openid%20pid&state=S&nonce=N\
        &code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM&code_challenge_method=S256";
    let response = app
        .clone()
        .oneshot(Request::builder().uri(authorize_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(
        axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec(),
    )
    .unwrap();
    let session_id = extract_session_id_from_request_uri(&html);

    let request_object_response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/verification/request-object/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(request_object_response.status(), StatusCode::OK);
    let jwt = String::from_utf8(
        axum::body::to_bytes(request_object_response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec(),
    )
    .unwrap();
    let payload = jwt.split('.').nth(1).unwrap();
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(payload).unwrap();
    let claims: Value = serde_json::from_slice(&decoded).unwrap();
    assert_eq!(claims["state"], session_id);

    let vp_token = vp_token_for(json!({"sub": "w1", "given_name": "Jane"}));
    let form = format!("state={session_id}&vp_token={vp_token}");
    let direct_post_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/verification/direct_post")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(direct_post_response.status(), StatusCode::FOUND);
    let location = direct_post_response
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with("https://rp.example/cb?code="));
    let code = location
        .split("code=")
        .nth(1)
        .unwrap()
        .split('&')
        .next()
        .unwrap()
        .to_string();

    let token_form = format!(
        "grant_type=authorization_code&code={code}&redirect_uri=https://rp.example/cb\
         &client_id=C1&client_secret=secret&code_verifier=dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"
    );
    let token_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(token_form))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(token_response.status(), StatusCode::OK);
    let body = json_body(token_response).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["scope"], "openid pid");
    let access_token = body["access_token"].as_str().unwrap().to_string();

    let id_token = body["id_token"].as_str().unwrap();
    let id_payload = id_token.split('.').nth(1).unwrap();
    let id_claims: Value =
        serde_json::from_slice(&base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(id_payload).unwrap())
            .unwrap();
    assert_eq!(id_claims["aud"], "C1");
    assert_eq!(id_claims["nonce"], "N");
    assert_eq!(id_claims["given_name"], "Jane");
    let sub = id_claims["sub"].as_str().unwrap().to_string();

    let userinfo_response = app
        .oneshot(
            Request::builder()
                .uri("/userinfo")
                .header("authorization", format!("Bearer {access_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(userinfo_response.status(), StatusCode::OK);
    let userinfo_body = json_body(userinfo_response).await;
    assert_eq!(userinfo_body["sub"], sub);
    assert_eq!(userinfo_body["given_name"], "Jane");
}

async fn drive_to_code(app: &axum::Router, pkce: bool) -> (String, String) {
    let authorize_uri = if pkce {
        "/authorize?response_type=code&client_id=C1&redirect_uri=https://rp.example/cb\
        &scope=openid&state=S&nonce=N\
        &code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM&code_challenge_method=S256"
    } else {
        "/authorize?response_type=code&client_id=C1&redirect_uri=https://rp.example/cb&scope=openid&state=S"
    };
    let response = app
        .clone()
        .oneshot(Request::builder().uri(authorize_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let html = String::from_utf8(
        axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec(),
    )
    .unwrap();
    let session_id = extract_session_id_from_request_uri(&html);

    let vp_token = vp_token_for(json!({"sub": "w1"}));
    let form = format!("state={session_id}&vp_token={vp_token}");
    let direct_post_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/verification/direct_post")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();
    let location = direct_post_response
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let code = location
        .split("code=")
        .nth(1)
        .unwrap()
        .split('&')
        .next()
        .unwrap()
        .to_string();
    (session_id, code)
}

/// E2 — code replay is rejected.
#[tokio::test]
async fn e2_code_replay_is_rejected() {
    let state = test_state(config(300)).await;
    state.clients.create(confidential_client(false)).await.unwrap();
    let sessions = state.sessions.clone();
    let app = build_router(state);

    let (session_id, code) = drive_to_code(&app, false).await;

    let token_form = format!(
        "grant_type=authorization_code&code={code}&redirect_uri=https://rp.example/cb\
         &client_id=C1&client_secret=secret"
    );
    let first = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(token_form.clone()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(token_form))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body = json_body(second).await;
    assert_eq!(body["error"], "invalid_grant");

    let session = sessions.get_by_id(&session_id).await.unwrap().unwrap();
    assert!(session.tokens.authorization_code_used);
}

/// E3 — PKCE mismatch, then the correct verifier still fails (code already used).
#[tokio::test]
async fn e3_pkce_mismatch_then_correct_verifier_still_fails() {
    let state = test_state(config(300)).await;
    state.clients.create(confidential_client(true)).await.unwrap();
    let app = build_router(state);

    let (_, code) = drive_to_code(&app, true).await;

    let wrong_form = format!(
        "grant_type=authorization_code&code={code}&redirect_uri=https://rp.example/cb\
         &client_id=C1&client_secret=secret&code_verifier=not-the-right-verifier"
    );
    let wrong = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(wrong_form))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(wrong).await["error"], "invalid_grant");

    let correct_form = format!(
        "grant_type=authorization_code&code={code}&redirect_uri=https://rp.example/cb\
         &client_id=C1&client_secret=secret&code_verifier=dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"
    );
    let correct = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(correct_form))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(correct.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(correct).await["error"], "invalid_grant");
}

/// E4 — session expiration.
#[tokio::test]
async fn e4_session_expiration() {
    let state = test_state(config(2)).await;
    state.clients.create(confidential_client(false)).await.unwrap();
    let app = build_router(state);

    let authorize_uri =
        "/authorize?response_type=code&client_id=C1&redirect_uri=https://rp.example/cb&scope=openid&state=S";
    let response = app
        .clone()
        .oneshot(Request::builder().uri(authorize_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let html = String::from_utf8(
        axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec(),
    )
    .unwrap();
    let session_id = extract_session_id_from_request_uri(&html);

    let immediate = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/verification/request-object/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(immediate.status(), StatusCode::OK);

    tokio::time::sleep(std::time::Duration::from_secs(3)).await;

    let expired = app
        .oneshot(
            Request::builder()
                .uri(format!("/verification/request-object/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(expired.status(), StatusCode::GONE);
    assert_eq!(json_body(expired).await["error"], "session_expired");
}

/// E5 — invalid redirect URI: error, no session created.
#[tokio::test]
async fn e5_invalid_redirect_uri_creates_no_session() {
    let state = test_state(config(300)).await;
    state.clients.create(confidential_client(false)).await.unwrap();
    let sessions = state.sessions.clone();
    let app = build_router(state);

    let authorize_uri =
        "/authorize?response_type=code&client_id=C1&redirect_uri=https://evil.example/cb&scope=openid&state=S";
    let response = app
        .oneshot(Request::builder().uri(authorize_uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::OK);

    assert!(sessions.get_by_authorization_code("anything").await.unwrap().is_none());
}

/// E6 — dynamic client registration round-trip.
#[tokio::test]
async fn e6_dynamic_client_registration_round_trip() {
    let state = test_state(config(300)).await;
    let app = build_router(state);

    let register_body = json!({"redirect_uris": ["https://c.example/cb"], "client_name": "X"});
    let register_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header("content-type", "application/json")
                .body(Body::from(register_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(register_response.status(), StatusCode::CREATED);
    let body = json_body(register_response).await;
    assert_eq!(body["client_secret_expires_at"], 0);
    let client_id = body["client_id"].as_str().unwrap().to_string();
    let registration_access_token = body["registration_access_token"].as_str().unwrap().to_string();
    assert!(body["client_secret"].is_string());

    let get_response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/register/{client_id}"))
                .header("authorization", format!("Bearer {registration_access_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(get_response.status(), StatusCode::OK);
    let fetched = json_body(get_response).await;
    assert_eq!(fetched["client_name"], "X");
    assert!(fetched.get("client_secret").is_none());

    let delete_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/register/{client_id}"))
                .header("authorization", format!("Bearer {registration_access_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(delete_response.status(), StatusCode::NO_CONTENT);

    let after_delete = app
        .oneshot(
            Request::builder()
                .uri(format!("/register/{client_id}"))
                .header("authorization", format!("Bearer {registration_access_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(after_delete.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(after_delete).await["error"], "invalid_client");
}
