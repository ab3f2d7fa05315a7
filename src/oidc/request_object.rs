use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::json;

use crate::keys::generate_request_object_nonce;
use crate::models::PresentationQuery;

use super::error::OidcError;
use super::state::AppState;

const REQUEST_OBJECT_CONTENT_TYPE: &str = "application/oauth-authz-req+jwt";

/// `GET /verification/request-object/{session_id}`: the signed JWT a wallet
/// fetches in response to the `request_uri` handed out at `/authorize`.
pub async fn request_object(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, OidcError> {
    let now = Utc::now();

    let mut session = state
        .sessions
        .get_by_id(&session_id)
        .await
        .map_err(|e| OidcError::ServerError(e.to_string()))?
        .ok_or(OidcError::SessionNotFound)?;

    if session.is_expired(now) {
        return Err(OidcError::SessionExpired);
    }

    if let Some(jwt) = state.request_object_cache.get(&session_id, now) {
        return Ok(with_content_type(jwt));
    }

    let nonce = generate_request_object_nonce();
    session.openid4vp.request_object_nonce = Some(nonce.clone());
    state
        .sessions
        .update(session.clone())
        .await
        .map_err(|e| OidcError::ServerError(e.to_string()))?;

    let response_mode = if state.config.openid4vp.digital_credentials.enabled {
        "dc_api.jwt"
    } else {
        "direct_post"
    };

    let mut claims = serde_json::Map::new();
    claims.insert("iss".into(), json!(state.config.oidc.issuer));
    claims.insert("aud".into(), json!("https://self-issued.me/v2"));
    claims.insert("iat".into(), json!(now.timestamp()));
    claims.insert("response_type".into(), json!("vp_token"));
    claims.insert("client_id".into(), json!(state.config.oidc.issuer));
    claims.insert("nonce".into(), json!(nonce));
    claims.insert("response_mode".into(), json!(response_mode));
    claims.insert(
        "response_uri".into(),
        json!(format!("{}/verification/direct_post", state.config.external_url)),
    );
    claims.insert("state".into(), json!(session_id));

    match session.openid4vp.query.as_ref() {
        Some(PresentationQuery::PresentationDefinition(v)) => {
            claims.insert("presentation_definition".into(), v.clone());
        }
        Some(PresentationQuery::Dcql(v)) => {
            claims.insert("dcql_query".into(), v.clone());
        }
        None => {}
    }

    let jwt = state
        .signing_key
        .sign(&serde_json::Value::Object(claims))
        .map_err(|e| OidcError::ServerError(e.to_string()))?;

    state.request_object_cache.insert(&session_id, jwt.clone(), now);

    Ok(with_content_type(jwt))
}

fn with_content_type(jwt: String) -> Response {
    ([(axum::http::header::CONTENT_TYPE, REQUEST_OBJECT_CONTENT_TYPE)], jwt).into_response()
}
