use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::PresentationQuery;

/// Parameters for a claim transform, keyed by transform type in `TransformRegistry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimTransformSpec {
    #[serde(rename = "type")]
    pub transform_type: String,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// A declarative recipe mapping an OIDC scope set to a wallet query.
///
/// Loaded once at boot from `openid4vp.presentation_requests_dir`; immutable
/// at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationRequestTemplate {
    pub id: String,
    pub scopes: Vec<String>,
    pub query: PresentationQuery,
    /// credential-claim-path -> OIDC-claim-name
    pub claim_mappings: HashMap<String, String>,
    /// OIDC-claim-name -> transform spec
    pub claim_transforms: HashMap<String, ClaimTransformSpec>,
    pub enabled: bool,
}

impl PresentationRequestTemplate {
    /// A template covers a requested scope set when its own scopes are a
    /// subset of what's requested.
    pub fn covers(&self, requested_scopes: &[String]) -> bool {
        self.enabled
            && self
                .scopes
                .iter()
                .all(|s| requested_scopes.iter().any(|r| r == s))
    }
}
