use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::keys::generate_authorization_code;
use crate::models::SessionStatus;

use super::error::OidcError;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DirectPostForm {
    pub state: String,
    pub vp_token: String,
    #[serde(default)]
    pub presentation_submission: Option<String>,
}

/// `POST /verification/direct_post`: the wallet's delivery of the VP token,
/// keyed by `state` (the session_id handed out at `/authorize`).
pub async fn direct_post(
    State(state): State<AppState>,
    Form(form): Form<DirectPostForm>,
) -> Result<Response, OidcError> {
    let now = Utc::now();

    let mut session = state
        .sessions
        .get_by_id(&form.state)
        .await
        .map_err(|e| OidcError::ServerError(e.to_string()))?
        .ok_or(OidcError::SessionNotFound)?;

    if session.is_expired(now) {
        return Err(OidcError::SessionExpired);
    }

    let template = state
        .presentation_builder
        .find_template_by_scopes(&session.oidc_request.scope);

    let claims = state
        .claims_extractor
        .extract_and_map_claims(&form.vp_token, template)
        .map_err(|e| OidcError::InvalidVp(e.to_string()))?;

    if let Some(submission) = &form.presentation_submission {
        if let Ok(parsed) = serde_json::from_str(submission) {
            session.openid4vp.presentation_submission = Some(parsed);
        }
    }

    if let Some(sub) = claims.get("sub").and_then(|v| v.as_str()) {
        session.openid4vp.wallet_id = Some(sub.to_string());
    }

    session.verified_claims = claims;

    let code = generate_authorization_code();
    session.tokens.authorization_code = Some(code.clone());
    session.tokens.code_expires_at = Some(now + Duration::seconds(state.config.oidc.code_duration_secs));

    if !session.transition(SessionStatus::CodeIssued) {
        return Err(OidcError::InvalidRequest(
            "session is not awaiting a presentation".into(),
        ));
    }

    state
        .sessions
        .update(session.clone())
        .await
        .map_err(|e| OidcError::ServerError(e.to_string()))?;

    if let Some(rp_state) = &session.oidc_request.state {
        let redirect_to = format!(
            "{}?code={}&state={}",
            session.oidc_request.redirect_uri, code, rp_state
        );
        Ok(Redirect::found(&redirect_to).into_response())
    } else {
        Ok(Json(json!({"status": "ok"})).into_response())
    }
}
