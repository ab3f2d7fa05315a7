use std::io::Cursor;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use qrcode::QrCode;
use serde::Deserialize;
use serde_json::json;

use super::error::OidcError;
use super::state::AppState;

/// `GET /qr/{session_id}`: a PNG-encoded QR code pointing the wallet at the
/// cross-device `openid4vp://` deep link for this session.
pub async fn qr_code(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, OidcError> {
    let session = state
        .sessions
        .get_by_id(&session_id)
        .await
        .map_err(|e| OidcError::ServerError(e.to_string()))?
        .ok_or(OidcError::SessionNotFound)?;

    let request_uri = format!(
        "{}/verification/request-object/{}",
        state.config.external_url, session.session_id
    );
    let encoded_request_uri: String = url::form_urlencoded::byte_serialize(request_uri.as_bytes()).collect();
    let deep_link = format!(
        "openid4vp://?client_id={}&request_uri={}",
        state.config.oidc.issuer, encoded_request_uri
    );

    let qr_code = QrCode::new(deep_link.as_bytes())
        .map_err(|e| OidcError::ServerError(format!("failed to build QR code: {e}")))?;
    let img_buf = qr_code.render::<image::Luma<u8>>().build();

    let mut buffer: Vec<u8> = Vec::new();
    let mut writer = Cursor::new(&mut buffer);
    img_buf
        .write_to(&mut writer, image::ImageFormat::Png)
        .map_err(|e| OidcError::ServerError(format!("failed to encode QR code: {e}")))?;

    Ok(([(axum::http::header::CONTENT_TYPE, "image/png")], buffer).into_response())
}

/// `GET /poll/{session_id}`: lets the RP-facing login page ask whether the
/// wallet has completed the presentation yet, without leaking token material.
pub async fn poll_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, OidcError> {
    let session = state
        .sessions
        .get_by_id(&session_id)
        .await
        .map_err(|e| OidcError::ServerError(e.to_string()))?
        .ok_or(OidcError::SessionNotFound)?;

    Ok(Json(json!({
        "status": session.status,
        "expired": session.is_expired(chrono::Utc::now()),
    })))
}

#[derive(Debug, Deserialize)]
pub struct VerificationCallbackQuery {
    pub session_id: String,
}

/// `GET /verification/callback`: a same-device completion path for wallets
/// that redirect the user agent directly back to the verifier instead of
/// posting to `/verification/direct_post`. Looks the session up by id and
/// forwards to the RP's `redirect_uri` with whatever outcome is on record.
pub async fn verification_callback(
    State(state): State<AppState>,
    Query(query): Query<VerificationCallbackQuery>,
) -> Result<Response, OidcError> {
    let session = state
        .sessions
        .get_by_id(&query.session_id)
        .await
        .map_err(|e| OidcError::ServerError(e.to_string()))?
        .ok_or(OidcError::SessionNotFound)?;

    let rp_state = session.oidc_request.state.clone().unwrap_or_default();

    let redirect_to = match (
        session.status,
        session.tokens.authorization_code.as_ref(),
    ) {
        (crate::models::SessionStatus::CodeIssued, Some(code)) => {
            format!("{}?code={}&state={}", session.oidc_request.redirect_uri, code, rp_state)
        }
        _ => format!(
            "{}?error=access_denied&state={}",
            session.oidc_request.redirect_uri, rp_state
        ),
    };

    Ok(Redirect::found(&redirect_to).into_response())
}
