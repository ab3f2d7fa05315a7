use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use crate::subject::compute_subject;

use super::error::OidcError;
use super::state::AppState;

/// `GET /userinfo`: bearer-token-gated claim lookup. Rejection is
/// deliberately a single code path (`UserinfoTokenRejected`) regardless of
/// whether the token is unknown, expired, or malformed, so a caller cannot
/// distinguish "no such token" from "expired token" (§7).
pub async fn userinfo(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, OidcError> {
    let token = extract_bearer_token(&headers).ok_or(OidcError::UserinfoTokenRejected)?;

    let session = state
        .sessions
        .get_by_access_token(&token)
        .await
        .map_err(|e| OidcError::ServerError(e.to_string()))?
        .ok_or(OidcError::UserinfoTokenRejected)?;

    let expires_at = session
        .tokens
        .access_token_expires_at
        .ok_or(OidcError::UserinfoTokenRejected)?;
    if Utc::now() > expires_at {
        return Err(OidcError::UserinfoTokenRejected);
    }

    let client = state
        .clients
        .get_by_client_id(&session.oidc_request.client_id)
        .await
        .map_err(|e| OidcError::ServerError(e.to_string()))?
        .ok_or(OidcError::UserinfoTokenRejected)?;

    let wallet_id = session.openid4vp.wallet_id.clone().unwrap_or_default();
    let sub = compute_subject(
        client.subject_type,
        &wallet_id,
        &session.oidc_request.client_id,
        &state.config.oidc.subject_salt,
    );

    let mut body = serde_json::Map::new();
    body.insert("sub".into(), serde_json::Value::String(sub));
    for (key, value) in &session.verified_claims {
        body.entry(key.clone()).or_insert_with(|| value.clone());
    }

    Ok(Json(serde_json::Value::Object(body)).into_response())
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(|s| s.trim().to_string())
}
