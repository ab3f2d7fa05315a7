use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token-endpoint authentication method a client may register (RFC 7591 §2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEndpointAuthMethod {
    ClientSecretBasic,
    ClientSecretPost,
    ClientSecretJwt,
    PrivateKeyJwt,
    None,
}

impl Default for TokenEndpointAuthMethod {
    fn default() -> Self {
        Self::ClientSecretBasic
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Code,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    Public,
    Pairwise,
}

impl Default for SubjectType {
    fn default() -> Self {
        Self::Public
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeChallengeMethod {
    S256,
    Plain,
}

/// Optional display metadata for a registered client (RFC 7591 §2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientDisplayMetadata {
    pub client_name: Option<String>,
    pub client_uri: Option<String>,
    pub logo_uri: Option<String>,
    pub contacts: Vec<String>,
    pub tos_uri: Option<String>,
    pub policy_uri: Option<String>,
}

/// A registered OIDC Relying Party.
///
/// `client_secret_hash` is `None` for public clients (`auth_method == None`).
/// `jwks` and `jwks_uri` are mutually exclusive; both may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub client_id: String,
    pub client_secret_hash: Option<String>,
    pub redirect_uris: Vec<String>,
    pub grant_types: Vec<GrantType>,
    pub response_types: Vec<ResponseType>,
    pub token_endpoint_auth_method: TokenEndpointAuthMethod,
    pub allowed_scopes: Vec<String>,
    pub default_scopes: Vec<String>,
    pub subject_type: SubjectType,
    pub jwks: Option<serde_json::Value>,
    pub jwks_uri: Option<String>,
    pub require_pkce: bool,
    pub code_challenge_required: bool,
    pub display: ClientDisplayMetadata,
    pub registration_access_token_hash: String,
    pub client_secret_expires_at: i64,
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Whether the client authenticates itself at the token endpoint.
    pub fn is_confidential(&self) -> bool {
        self.token_endpoint_auth_method != TokenEndpointAuthMethod::None
    }

    pub fn supports_grant(&self, grant: GrantType) -> bool {
        self.grant_types.contains(&grant)
    }

    pub fn allows_redirect_uri(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.iter().any(|u| u == redirect_uri)
    }
}
