use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A wallet-facing presentation query, opaque to the core beyond its shape.
///
/// The signer and the wallet are the only components that interpret the
/// inner value; the core only ever moves it from session creation through
/// request-object signing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "query")]
pub enum PresentationQuery {
    PresentationDefinition(serde_json::Value),
    Dcql(serde_json::Value),
}

/// The captured subset of the original OIDC authorize request that later
/// handlers (direct_post, token) need to re-validate against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: Vec<String>,
    pub state: Option<String>,
    pub nonce: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

/// The OpenID4VP sub-record: everything about the wallet-facing half of the flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Openid4vpRecord {
    pub query: Option<PresentationQuery>,
    pub request_object_nonce: Option<String>,
    pub vp_token: Option<String>,
    pub presentation_submission: Option<serde_json::Value>,
    pub wallet_id: Option<String>,
}

/// Authorization code + access/refresh token lifecycle state for a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenSet {
    pub authorization_code: Option<String>,
    pub authorization_code_used: bool,
    pub code_expires_at: Option<DateTime<Utc>>,
    pub access_token: Option<String>,
    pub access_token_expires_at: Option<DateTime<Utc>>,
    pub refresh_token: Option<String>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    pub id_token: Option<String>,
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    AwaitingPresentation,
    CodeIssued,
    TokenIssued,
    Completed,
    Expired,
    Error,
}

impl SessionStatus {
    /// Forward-only transitions: no reverse transition is ever permitted.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Pending, AwaitingPresentation)
                | (Pending, CodeIssued)
                | (Pending, Error)
                | (AwaitingPresentation, CodeIssued)
                | (AwaitingPresentation, Error)
                | (CodeIssued, TokenIssued)
                | (TokenIssued, Completed)
                | (_, Expired)
        )
    }
}

/// One RP-initiated authentication attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub oidc_request: OidcRequest,
    pub openid4vp: Openid4vpRecord,
    pub verified_claims: HashMap<String, serde_json::Value>,
    pub tokens: TokenSet,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Apply a forward transition, rejecting (silently, by not mutating)
    /// any transition that isn't strictly forward. Callers check the return
    /// value to decide whether to surface an error.
    pub fn transition(&mut self, next: SessionStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_allowed() {
        assert!(SessionStatus::Pending.can_transition_to(SessionStatus::CodeIssued));
        assert!(SessionStatus::CodeIssued.can_transition_to(SessionStatus::TokenIssued));
        assert!(SessionStatus::TokenIssued.can_transition_to(SessionStatus::Completed));
    }

    #[test]
    fn reverse_transitions_rejected() {
        assert!(!SessionStatus::CodeIssued.can_transition_to(SessionStatus::Pending));
        assert!(!SessionStatus::TokenIssued.can_transition_to(SessionStatus::CodeIssued));
    }

    #[test]
    fn any_state_can_expire() {
        assert!(SessionStatus::Pending.can_transition_to(SessionStatus::Expired));
        assert!(SessionStatus::TokenIssued.can_transition_to(SessionStatus::Expired));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let mut session = sample_session(now);
        session.expires_at = now;
        assert!(session.is_expired(now));
    }

    fn sample_session(now: DateTime<Utc>) -> Session {
        Session {
            session_id: "sid".into(),
            created_at: now,
            expires_at: now,
            status: SessionStatus::Pending,
            oidc_request: OidcRequest {
                client_id: "c1".into(),
                redirect_uri: "https://rp.example/cb".into(),
                scope: vec!["openid".into()],
                state: None,
                nonce: None,
                code_challenge: None,
                code_challenge_method: None,
            },
            openid4vp: Openid4vpRecord::default(),
            verified_claims: HashMap::new(),
            tokens: TokenSet::default(),
        }
    }
}
