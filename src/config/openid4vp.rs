use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// OpenID4VP wallet-facing configuration (§6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Openid4vpConfig {
    /// Directory of presentation-request template files. An empty/absent
    /// directory triggers the legacy scope→credential mapping.
    pub presentation_requests_dir: Option<std::path::PathBuf>,
    /// Legacy scope→credential-type map, used when no template covers the
    /// requested scopes.
    #[serde(default)]
    pub supported_credentials: HashMap<String, String>,
    #[serde(default)]
    pub digital_credentials: DigitalCredentialsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DigitalCredentialsConfig {
    #[serde(default)]
    pub enabled: bool,
}
