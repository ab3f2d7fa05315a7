use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use base64::Engine;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::keys::{generate_token, verify_client_secret};
use crate::models::SessionStatus;
use crate::store::MarkCodeOutcome;
use crate::subject::compute_subject;
use crate::validation::{parse_code_challenge_method, validate_pkce};

use super::error::OidcError;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub grant_type: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub code_verifier: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// `POST /token`: the authorization_code grant. `refresh_token` is a
/// recognized but unimplemented arm (§9 open question 2 keeps it out of
/// discovery's `grant_types_supported` to match).
pub async fn token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<TokenForm>,
) -> Result<Response, OidcError> {
    if form.grant_type != "authorization_code" {
        return Err(OidcError::UnsupportedGrantType(form.grant_type));
    }

    let code = form
        .code
        .ok_or_else(|| OidcError::InvalidRequest("code is required".into()))?;

    let mut session = state
        .sessions
        .get_by_authorization_code(&code)
        .await
        .map_err(|e| OidcError::ServerError(e.to_string()))?
        .ok_or_else(|| OidcError::InvalidGrant("unknown authorization code".into()))?;

    if session.tokens.authorization_code_used {
        return Err(OidcError::InvalidGrant("authorization code already used".into()));
    }

    let now = Utc::now();
    let code_expires_at = session
        .tokens
        .code_expires_at
        .ok_or_else(|| OidcError::InvalidGrant("authorization code has no recorded expiry".into()))?;
    if now > code_expires_at {
        return Err(OidcError::InvalidGrant("authorization code has expired".into()));
    }

    let (client_id, client_secret) = extract_client_credentials(&headers, &form)?;

    let client = state
        .clients
        .get_by_client_id(&client_id)
        .await
        .map_err(|e| OidcError::ServerError(e.to_string()))?
        .ok_or_else(|| OidcError::InvalidClientAuth("unknown client".into()))?;

    if client.is_confidential() {
        let presented = client_secret
            .ok_or_else(|| OidcError::InvalidClientAuth("client_secret is required".into()))?;
        let hash = client
            .client_secret_hash
            .as_deref()
            .ok_or_else(|| OidcError::InvalidClientAuth("client has no secret on file".into()))?;
        if !verify_client_secret(&presented, hash) {
            return Err(OidcError::InvalidClientAuth("client secret does not match".into()));
        }
    }

    if session.oidc_request.client_id != client_id {
        return Err(OidcError::InvalidGrant(
            "client_id does not match the original authorization request".into(),
        ));
    }

    let redirect_uri = form
        .redirect_uri
        .ok_or_else(|| OidcError::InvalidRequest("redirect_uri is required".into()))?;
    if session.oidc_request.redirect_uri != redirect_uri {
        return Err(OidcError::InvalidGrant(
            "redirect_uri does not match the original authorization request".into(),
        ));
    }

    if let Some(recorded_challenge) = session
        .oidc_request
        .code_challenge
        .clone()
        .filter(|c| !c.is_empty())
    {
        let verifier = form
            .code_verifier
            .ok_or_else(|| OidcError::InvalidGrant("code_verifier is required".into()))?;
        let method = session
            .oidc_request
            .code_challenge_method
            .as_deref()
            .and_then(parse_code_challenge_method)
            .unwrap_or(crate::models::CodeChallengeMethod::Plain);
        if !validate_pkce(&verifier, &recorded_challenge, method) {
            return Err(OidcError::InvalidGrant("PKCE verification failed".into()));
        }
    }

    let outcome = state
        .sessions
        .mark_code_as_used(&session.session_id)
        .await
        .map_err(|e| OidcError::ServerError(e.to_string()))?;

    if outcome == MarkCodeOutcome::AlreadyUsed {
        // Defense in depth per the design notes: a detected replay also
        // revokes any tokens already issued from this code.
        session.tokens.access_token = None;
        session.tokens.refresh_token = None;
        let _ = state.sessions.update(session).await;
        return Err(OidcError::InvalidGrant("authorization code already used".into()));
    }
    session.tokens.authorization_code_used = true;

    let wallet_id = session.openid4vp.wallet_id.clone().unwrap_or_default();
    let sub = compute_subject(
        client.subject_type,
        &wallet_id,
        &client_id,
        &state.config.oidc.subject_salt,
    );

    let access_token = generate_token();
    let refresh_token = generate_token();
    let access_expires_at = now + Duration::seconds(state.config.oidc.access_token_duration_secs);
    let refresh_expires_at = now + Duration::seconds(state.config.oidc.refresh_token_duration_secs);

    let mut id_claims = serde_json::Map::new();
    id_claims.insert("iss".into(), json!(state.config.oidc.issuer));
    id_claims.insert("sub".into(), json!(sub));
    id_claims.insert("aud".into(), json!(client_id));
    id_claims.insert("iat".into(), json!(now.timestamp()));
    id_claims.insert(
        "exp".into(),
        json!(now.timestamp() + state.config.oidc.id_token_duration_secs),
    );
    if let Some(nonce) = &session.oidc_request.nonce {
        id_claims.insert("nonce".into(), json!(nonce));
    }
    for (key, value) in &session.verified_claims {
        id_claims.entry(key.clone()).or_insert_with(|| value.clone());
    }

    let id_token = state
        .signing_key
        .sign(&serde_json::Value::Object(id_claims))
        .map_err(|e| OidcError::ServerError(e.to_string()))?;

    session.tokens.access_token = Some(access_token.clone());
    session.tokens.access_token_expires_at = Some(access_expires_at);
    session.tokens.refresh_token = Some(refresh_token.clone());
    session.tokens.refresh_token_expires_at = Some(refresh_expires_at);
    session.tokens.id_token = Some(id_token.clone());
    session.tokens.token_type = Some("Bearer".into());
    session.transition(SessionStatus::TokenIssued);

    let scope = session.oidc_request.scope.join(" ");

    state
        .sessions
        .update(session)
        .await
        .map_err(|e| OidcError::ServerError(e.to_string()))?;

    let body = json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": state.config.oidc.access_token_duration_secs,
        "refresh_token": refresh_token,
        "id_token": id_token,
        "scope": scope,
    });

    let mut response = (StatusCode::OK, Json(body)).into_response();
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));
    response
        .headers_mut()
        .insert("Pragma", HeaderValue::from_static("no-cache"));
    Ok(response)
}

/// Client credentials arrive either via HTTP Basic auth (`client_secret_basic`)
/// or as form fields (`client_secret_post`/public clients).
fn extract_client_credentials(
    headers: &HeaderMap,
    form: &TokenForm,
) -> Result<(String, Option<String>), OidcError> {
    if let Some(value) = headers.get(axum::http::header::AUTHORIZATION) {
        let raw = value
            .to_str()
            .map_err(|_| OidcError::InvalidRequest("malformed Authorization header".into()))?;
        if let Some(encoded) = raw.strip_prefix("Basic ") {
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|_| OidcError::InvalidRequest("malformed Basic credentials".into()))?;
            let decoded = String::from_utf8(decoded)
                .map_err(|_| OidcError::InvalidRequest("malformed Basic credentials".into()))?;
            let mut parts = decoded.splitn(2, ':');
            let client_id = parts.next().unwrap_or_default().to_string();
            let client_secret = parts.next().map(str::to_string);
            return Ok((client_id, client_secret));
        }
    }

    let client_id = form
        .client_id
        .clone()
        .ok_or_else(|| OidcError::InvalidRequest("client_id is required".into()))?;
    Ok((client_id, form.client_secret.clone()))
}
