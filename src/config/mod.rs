//! Configuration for the verifier proxy.
//!
//! Loaded from a TOML file, with `${VAR_NAME}` environment-variable
//! interpolation.
//!
//! # Example
//!
//! ```toml
//! external_url = "https://verifier.example.com"
//!
//! [oidc]
//! issuer = "https://verifier.example.com"
//! signing_key_path = "/etc/verifier-proxy/signing-key.pem"
//! session_duration_secs = 300
//! code_duration_secs = 60
//! access_token_duration_secs = 3600
//! id_token_duration_secs = 3600
//! refresh_token_duration_secs = 2592000
//! subject_salt = "${SUBJECT_SALT}"
//! ```

mod limits;
mod logging;
mod oidc;
mod openid4vp;
mod server;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use limits::{LimitsConfig, RateLimitsConfig, TokenBucketConfig};
pub use logging::{LogFormat, LoggingConfig};
pub use oidc::{OidcConfig, SigningAlg};
pub use openid4vp::{DigitalCredentialsConfig, Openid4vpConfig};
pub use server::{ServerConfig, TrustedProxiesConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub external_url: String,
    pub oidc: OidcConfig,
    #[serde(default)]
    pub openid4vp: Openid4vpConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;
        Self::from_str(&contents)
    }

    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: Config = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.oidc.validate().map_err(ConfigError::Validation)?;

        if self.external_url.is_empty() {
            return Err(ConfigError::Validation("external_url must not be empty".into()));
        }

        if !self.server.trusted_proxies.is_configured()
            && self.server.host != "127.0.0.1"
            && self.server.host != "::1"
        {
            tracing::warn!(
                "server.trusted_proxies is not configured and the server binds to a \
                 non-loopback address; X-Forwarded-For will be ignored and rate limiting \
                 will key off the directly connecting address, which is the load balancer's \
                 own address behind most proxies."
            );
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("configuration validation error: {0}")]
    Validation(String),
}

/// Expand `${VAR_NAME}` references, skipping anything after a `#` comment
/// on the same line.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');
        let mut line_result = String::with_capacity(line.len());
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let match_start = cap.get(0).unwrap().start();
            if let Some(pos) = comment_pos {
                if match_start >= pos {
                    continue;
                }
            }

            line_result.push_str(&line[last_end..match_start]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            line_result.push_str(&value);

            last_end = cap.get(0).unwrap().end();
        }

        line_result.push_str(&line[last_end..]);
        result.push_str(&line_result);
        result.push('\n');
    }

    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}
