use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct OAuthErrorBody {
    error: &'static str,
    error_description: String,
}

/// The flow engine's (C8) error taxonomy (§7). Each variant carries enough
/// detail to render the canonical OAuth2 JSON error body and status code;
/// the two 401 cases additionally carry a `WWW-Authenticate` header.
#[derive(Debug)]
pub enum OidcError {
    InvalidRequest(String),
    /// Unknown client at `/authorize`: no WWW-Authenticate, no state is
    /// mutated, and the RP is not a peer we can safely redirect back to.
    InvalidClient(String),
    /// Client authentication failure at `/token` (§4.1 step 4): 401 with
    /// `WWW-Authenticate: Basic`.
    InvalidClientAuth(String),
    InvalidGrant(String),
    InvalidScope(String),
    UnauthorizedClient(String),
    UnsupportedGrantType(String),
    AccessDenied(String),
    ServerError(String),
    SessionNotFound,
    SessionExpired,
    InvalidVp(String),
    /// UserInfo bearer-token rejection (§4.1): body carries `invalid_grant`,
    /// header carries `Bearer error="invalid_token"`.
    UserinfoTokenRejected,
    /// Registration-access-token rejection on GET/PUT/DELETE `/register/{id}`
    /// (§4.4, §8): body and header both carry `invalid_token`.
    InvalidRegistrationToken,
}

impl std::fmt::Display for OidcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for OidcError {}

impl OidcError {
    /// The bare `error` code, used when an error must be carried as a query
    /// parameter on an RP redirect rather than rendered as a JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            OidcError::InvalidRequest(_) => "invalid_request",
            OidcError::InvalidClient(_) | OidcError::InvalidClientAuth(_) => "invalid_client",
            OidcError::InvalidGrant(_) => "invalid_grant",
            OidcError::InvalidScope(_) => "invalid_scope",
            OidcError::UnauthorizedClient(_) => "unauthorized_client",
            OidcError::UnsupportedGrantType(_) => "unsupported_grant_type",
            OidcError::AccessDenied(_) => "access_denied",
            OidcError::ServerError(_) => "server_error",
            OidcError::SessionNotFound => "session_not_found",
            OidcError::SessionExpired => "session_expired",
            OidcError::InvalidVp(_) => "invalid_vp",
            OidcError::UserinfoTokenRejected => "invalid_grant",
            OidcError::InvalidRegistrationToken => "invalid_token",
        }
    }
}

impl IntoResponse for OidcError {
    fn into_response(self) -> Response {
        if !matches!(
            self,
            OidcError::ServerError(_) | OidcError::InvalidVp(_)
        ) {
            tracing::debug!(error = %self, "oidc request rejected");
        } else {
            tracing::error!(error = %self, "oidc request failed");
        }

        let status = match &self {
            OidcError::InvalidRequest(_)
            | OidcError::InvalidGrant(_)
            | OidcError::InvalidScope(_)
            | OidcError::UnsupportedGrantType(_)
            | OidcError::InvalidVp(_) => StatusCode::BAD_REQUEST,
            OidcError::InvalidClient(_) => StatusCode::BAD_REQUEST,
            OidcError::InvalidClientAuth(_)
            | OidcError::UserinfoTokenRejected
            | OidcError::InvalidRegistrationToken => StatusCode::UNAUTHORIZED,
            OidcError::UnauthorizedClient(_) | OidcError::AccessDenied(_) => StatusCode::FORBIDDEN,
            OidcError::SessionNotFound => StatusCode::NOT_FOUND,
            OidcError::SessionExpired => StatusCode::GONE,
            OidcError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let description = match &self {
            OidcError::InvalidRequest(m)
            | OidcError::InvalidClient(m)
            | OidcError::InvalidClientAuth(m)
            | OidcError::InvalidGrant(m)
            | OidcError::InvalidScope(m)
            | OidcError::UnauthorizedClient(m)
            | OidcError::UnsupportedGrantType(m)
            | OidcError::AccessDenied(m)
            | OidcError::ServerError(m)
            | OidcError::InvalidVp(m) => m.clone(),
            OidcError::SessionNotFound => "session not found".to_string(),
            OidcError::SessionExpired => "session has expired".to_string(),
            OidcError::UserinfoTokenRejected => "access token is invalid or expired".to_string(),
            OidcError::InvalidRegistrationToken => "registration access token is invalid".to_string(),
        };

        let body = OAuthErrorBody {
            error: self.code(),
            error_description: description,
        };

        let mut response = (status, Json(body)).into_response();

        match &self {
            OidcError::InvalidClientAuth(_) => {
                response.headers_mut().insert(
                    "WWW-Authenticate",
                    HeaderValue::from_static("Basic realm=\"token\""),
                );
            }
            OidcError::UserinfoTokenRejected => {
                response.headers_mut().insert(
                    "WWW-Authenticate",
                    HeaderValue::from_static("Bearer error=\"invalid_token\""),
                );
            }
            OidcError::InvalidRegistrationToken => {
                response.headers_mut().insert(
                    "WWW-Authenticate",
                    HeaderValue::from_static("Bearer error=\"invalid_token\""),
                );
            }
            _ => {}
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn userinfo_rejection_carries_bearer_header_but_invalid_grant_body() {
        let response = OidcError::UserinfoTokenRejected.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("WWW-Authenticate").unwrap(),
            "Bearer error=\"invalid_token\""
        );
        assert_eq!(OidcError::UserinfoTokenRejected.code(), "invalid_grant");
    }

    #[test]
    fn client_auth_failure_is_401_with_basic_challenge() {
        let response = OidcError::InvalidClientAuth("bad secret".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("WWW-Authenticate"));
    }

    #[test]
    fn session_expired_uses_its_own_code() {
        assert_eq!(OidcError::SessionExpired.code(), "session_expired");
    }
}
