use serde::{Deserialize, Serialize};

use crate::models::SubjectType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SigningAlg {
    RS256,
    RS384,
    RS512,
    ES256,
    ES384,
    ES512,
}

impl std::fmt::Display for SigningAlg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SigningAlg::RS256 => "RS256",
            SigningAlg::RS384 => "RS384",
            SigningAlg::RS512 => "RS512",
            SigningAlg::ES256 => "ES256",
            SigningAlg::ES384 => "ES384",
            SigningAlg::ES512 => "ES512",
        };
        f.write_str(s)
    }
}

fn default_signing_alg() -> SigningAlg {
    SigningAlg::RS256
}

/// OIDC provider-facing configuration (§6). All durations are mandatory —
/// there is no compiled-in fallback, so a missing duration is a config parse
/// error rather than a silently-hardcoded lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    pub issuer: String,
    pub signing_key_path: std::path::PathBuf,
    #[serde(default = "default_signing_alg")]
    pub signing_alg: SigningAlg,
    pub session_duration_secs: i64,
    pub code_duration_secs: i64,
    pub access_token_duration_secs: i64,
    pub id_token_duration_secs: i64,
    pub refresh_token_duration_secs: i64,
    #[serde(default)]
    pub subject_type: SubjectType,
    pub subject_salt: String,
}

impl OidcConfig {
    pub fn validate(&self) -> Result<(), String> {
        let durations = [
            ("oidc.session_duration_secs", self.session_duration_secs),
            ("oidc.code_duration_secs", self.code_duration_secs),
            ("oidc.access_token_duration_secs", self.access_token_duration_secs),
            ("oidc.id_token_duration_secs", self.id_token_duration_secs),
            ("oidc.refresh_token_duration_secs", self.refresh_token_duration_secs),
        ];
        for (name, value) in durations {
            if value <= 0 {
                return Err(format!("{name} must be a positive number of seconds"));
            }
        }
        if self.subject_salt.is_empty() {
            return Err("oidc.subject_salt must not be empty".into());
        }
        if self.signing_alg == SigningAlg::ES512 {
            return Err(
                "oidc.signing_alg: ES512 is not exposed by the jsonwebtoken crate's Algorithm enum".into(),
            );
        }
        Ok(())
    }
}
