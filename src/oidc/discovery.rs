use axum::extract::State;
use axum::Json;
use serde_json::json;

use super::state::AppState;

/// `GET /.well-known/openid-configuration`.
///
/// `grant_types_supported` deliberately omits `refresh_token`: the token
/// handler recognizes but rejects that grant, and declaring support a
/// client will never receive would violate OIDC conformance (§9 open
/// question 2).
pub async fn discovery(State(state): State<AppState>) -> Json<serde_json::Value> {
    let external_url = &state.config.external_url;

    let mut scopes: Vec<String> = vec!["openid".into(), "profile".into(), "email".into()];
    for scope in state.config.openid4vp.supported_credentials.keys() {
        if !scopes.contains(scope) {
            scopes.push(scope.clone());
        }
    }

    Json(json!({
        "issuer": state.config.oidc.issuer,
        "authorization_endpoint": format!("{external_url}/authorize"),
        "token_endpoint": format!("{external_url}/token"),
        "userinfo_endpoint": format!("{external_url}/userinfo"),
        "jwks_uri": format!("{external_url}/jwks"),
        "registration_endpoint": format!("{external_url}/register"),
        "response_types_supported": ["code"],
        "subject_types_supported": ["public", "pairwise"],
        "id_token_signing_alg_values_supported": [state.signing_key.algorithm_name()],
        "scopes_supported": scopes,
        "claims_supported": ["sub", "given_name", "family_name", "birthdate", "email"],
        "grant_types_supported": ["authorization_code"],
        "code_challenge_methods_supported": ["S256"],
        "token_endpoint_auth_methods_supported": [
            "client_secret_basic",
            "client_secret_post",
            "client_secret_jwt",
            "private_key_jwt",
            "none",
        ],
    }))
}

/// `GET /jwks`: the active signing key's public half. An EC-configured
/// deployment serves an empty `keys` array (see `SigningKey::jwk`).
pub async fn jwks(State(state): State<AppState>) -> Json<serde_json::Value> {
    let keys: Vec<serde_json::Value> = state.signing_key.jwk().into_iter().collect();
    Json(json!({ "keys": keys }))
}
