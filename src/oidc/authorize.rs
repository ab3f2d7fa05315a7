use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::keys::generate_session_id;
use crate::models::{OidcRequest, ResponseType, Session, SessionStatus, TokenSet};
use crate::presentation::ClaimsExtractor;
use crate::validation::{validate_redirect_uri, validate_scopes};

use super::error::OidcError;
use super::state::AppState;

/// Query parameters accepted at `/authorize`. `scope` arrives space-separated
/// per OAuth2; we split it ourselves rather than asking serde to do it.
#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub response_type: String,
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(default)]
    pub scope: String,
    pub state: Option<String>,
    pub nonce: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

/// An authorize-time failure that has already cleared client/redirect_uri
/// validation is safe to report back to the RP via redirect; one that
/// hasn't is rendered as a local HTML error page instead, since redirecting
/// to an unverified `redirect_uri` would be an open redirect.
enum AuthorizeOutcome {
    Redirectable { redirect_uri: String, state: Option<String> },
    Local,
}

pub async fn authorize(
    State(state): State<AppState>,
    Query(query): Query<AuthorizeQuery>,
) -> Response {
    match authorize_inner(&state, &query).await {
        Ok(html) => Html(html).into_response(),
        Err((err, outcome)) => match outcome {
            AuthorizeOutcome::Redirectable { redirect_uri, state } => {
                let mut target = format!("{redirect_uri}?error={}", err.code());
                if let Some(state) = state {
                    target.push_str(&format!("&state={state}"));
                }
                Redirect::found(&target).into_response()
            }
            AuthorizeOutcome::Local => err.into_response(),
        },
    }
}

async fn authorize_inner(
    state: &AppState,
    query: &AuthorizeQuery,
) -> Result<String, (OidcError, AuthorizeOutcome)> {
    let client = state
        .clients
        .get_by_client_id(&query.client_id)
        .await
        .map_err(|e| (OidcError::ServerError(e.to_string()), AuthorizeOutcome::Local))?
        .ok_or_else(|| {
            (
                OidcError::InvalidClient("unknown client_id".into()),
                AuthorizeOutcome::Local,
            )
        })?;

    if !validate_redirect_uri(&client, &query.redirect_uri) {
        return Err((
            OidcError::InvalidRequest("redirect_uri is not registered for this client".into()),
            AuthorizeOutcome::Local,
        ));
    }

    // From here on, redirect_uri is a trusted RP endpoint: later failures can
    // be reported back to it instead of rendered locally.
    let redirectable = AuthorizeOutcome::Redirectable {
        redirect_uri: query.redirect_uri.clone(),
        state: query.state.clone(),
    };

    if query.response_type != "code" || !client.response_types.contains(&ResponseType::Code) {
        return Err((
            OidcError::UnauthorizedClient("response_type is not permitted for this client".into()),
            redirectable,
        ));
    }

    let requested_scopes: Vec<String> = query
        .scope
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if !validate_scopes(&requested_scopes, &client.allowed_scopes) {
        return Err((
            OidcError::InvalidScope("requested scope exceeds the client's allowed scopes".into()),
            redirectable,
        ));
    }

    if client.require_pkce && query.code_challenge.as_deref().unwrap_or("").is_empty() {
        return Err((
            OidcError::InvalidRequest("this client requires a PKCE code_challenge".into()),
            redirectable,
        ));
    }

    let session_id = generate_session_id();
    let now = Utc::now();
    let wallet_query = state.presentation_builder.build_from_scopes(&requested_scopes);

    let session = Session {
        session_id: session_id.clone(),
        created_at: now,
        expires_at: now + Duration::seconds(state.config.oidc.session_duration_secs),
        status: SessionStatus::Pending,
        oidc_request: OidcRequest {
            client_id: query.client_id.clone(),
            redirect_uri: query.redirect_uri.clone(),
            scope: requested_scopes,
            state: query.state.clone(),
            nonce: query.nonce.clone(),
            code_challenge: query.code_challenge.clone(),
            code_challenge_method: query.code_challenge_method.clone(),
        },
        openid4vp: crate::models::Openid4vpRecord {
            query: Some(wallet_query),
            ..Default::default()
        },
        verified_claims: Default::default(),
        tokens: TokenSet::default(),
    };

    state
        .sessions
        .create(session)
        .await
        .map_err(|e| (OidcError::ServerError(e.to_string()), AuthorizeOutcome::Local))?;

    Ok(render_authorize_page(state, &session_id))
}

fn render_authorize_page(state: &AppState, session_id: &str) -> String {
    let external_url = &state.config.external_url;
    let deep_link = format!(
        "openid4vp://?client_id={}&request_uri={external_url}/verification/request-object/{session_id}",
        state.config.oidc.issuer,
    );
    let qr_url = format!("{external_url}/qr/{session_id}");
    let poll_url = format!("{external_url}/poll/{session_id}");

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Present your credential</title></head>
<body>
<h1>Scan with your wallet</h1>
<img src="{qr_url}" alt="QR code" />
<p><a href="{deep_link}">Open in wallet</a></p>
<p data-poll-url="{poll_url}">Waiting for the wallet to respond&hellip;</p>
</body>
</html>"#
    )
}
