use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    error_description: String,
}

/// Dynamic client registration's error taxonomy (§4.4, §7), kept distinct
/// from `OidcError` since RFC 7591/7592 define their own error vocabulary.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("invalid client metadata: {0}")]
    InvalidClientMetadata(String),
    #[error("unknown client_id")]
    InvalidClient,
    #[error("registration access token is invalid")]
    InvalidToken,
    #[error("registration store failure: {0}")]
    ServerError(String),
}

impl IntoResponse for RegistrationError {
    fn into_response(self) -> Response {
        if matches!(self, RegistrationError::ServerError(_)) {
            tracing::error!(error = %self, "registration request failed");
        } else {
            tracing::debug!(error = %self, "registration request rejected");
        }

        let (status, code) = match &self {
            RegistrationError::InvalidClientMetadata(_) => {
                (StatusCode::BAD_REQUEST, "invalid_client_metadata")
            }
            RegistrationError::InvalidClient => (StatusCode::BAD_REQUEST, "invalid_client"),
            RegistrationError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            RegistrationError::ServerError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
        };

        let body = ErrorBody {
            error: code,
            error_description: self.to_string(),
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, RegistrationError::InvalidToken) {
            response.headers_mut().insert(
                "WWW-Authenticate",
                HeaderValue::from_static("Bearer error=\"invalid_token\""),
            );
        }
        response
    }
}
