use base64::Engine;
use std::collections::HashMap;

use crate::models::{PresentationQuery, PresentationRequestTemplate};

use super::transforms::{TransformError, TransformRegistry};

#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    #[error("VP token is not well-formed: {0}")]
    Malformed(String),
    #[error("claim transform failed: {0}")]
    Transform(#[from] TransformError),
}

/// The VP-token / SD-JWT parser contract (§6): a black box that extracts
/// disclosed claims from a VP token. The core never parses the token
/// itself beyond this trait boundary.
pub trait VpTokenParser: Send + Sync {
    fn extract_claims_from_vp_token(
        &self,
        vp_token: &str,
    ) -> Result<HashMap<String, serde_json::Value>, ClaimsError>;
}

/// Stand-in for the real SD-JWT verifier this system treats as an external
/// collaborator (§1, §6). It decodes the disclosed-claims payload segment of
/// a `.`-joined SD-JWT-shaped token as base64url JSON, performing no
/// signature verification and no disclosure-digest checking — exactly the
/// "black box" framing the interface contract describes. A production
/// deployment replaces this with a real SD-JWT verifier behind the same
/// trait.
#[derive(Default)]
pub struct SdJwtShapedParser;

impl VpTokenParser for SdJwtShapedParser {
    fn extract_claims_from_vp_token(
        &self,
        vp_token: &str,
    ) -> Result<HashMap<String, serde_json::Value>, ClaimsError> {
        let payload_segment = vp_token
            .split('.')
            .nth(1)
            .ok_or_else(|| ClaimsError::Malformed("expected at least two '.'-separated segments".into()))?;

        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload_segment)
            .map_err(|e| ClaimsError::Malformed(e.to_string()))?;

        let value: serde_json::Value =
            serde_json::from_slice(&decoded).map_err(|e| ClaimsError::Malformed(e.to_string()))?;

        match value {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(ClaimsError::Malformed(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

/// C6: turns a VP token plus a claim-mapping table into an OIDC claim set.
pub struct ClaimsExtractor<P: VpTokenParser> {
    parser: P,
    transforms: TransformRegistry,
}

impl<P: VpTokenParser> ClaimsExtractor<P> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            transforms: TransformRegistry::default(),
        }
    }

    /// `ExtractClaimsFromVPToken` (§6): no template known, claims are
    /// returned as-is.
    pub fn extract_claims_from_vp_token(
        &self,
        vp_token: &str,
    ) -> Result<HashMap<String, serde_json::Value>, ClaimsError> {
        self.parser.extract_claims_from_vp_token(vp_token)
    }

    /// `ExtractAndMapClaims` (§6): applies the template's claim mapping and
    /// then its transforms. When no template is known, falls back to basic
    /// extraction with no error surfaced (§8 boundary behavior).
    pub fn extract_and_map_claims(
        &self,
        vp_token: &str,
        template: Option<&PresentationRequestTemplate>,
    ) -> Result<HashMap<String, serde_json::Value>, ClaimsError> {
        let raw = self.extract_claims_from_vp_token(vp_token)?;

        let Some(template) = template else {
            return Ok(raw);
        };

        let mut mapped = HashMap::new();
        for (credential_path, oidc_name) in &template.claim_mappings {
            let Some(value) = raw.get(credential_path) else {
                continue;
            };
            mapped.insert(oidc_name.clone(), value.clone());
        }
        // Carry through any claim not covered by an explicit mapping, so a
        // partially specified template doesn't silently drop data.
        for (key, value) in &raw {
            mapped.entry(key.clone()).or_insert_with(|| value.clone());
        }

        for (oidc_name, spec) in &template.claim_transforms {
            if let Some(value) = mapped.get(oidc_name) {
                let transformed = self.transforms.apply(spec, value)?;
                mapped.insert(oidc_name.clone(), transformed);
            }
        }

        Ok(mapped)
    }
}
