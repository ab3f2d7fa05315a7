use serde::{Deserialize, Serialize};

/// One token-bucket family's settings (§4.7).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenBucketConfig {
    pub requests_per_minute: u32,
    pub burst: u32,
}

impl TokenBucketConfig {
    /// Tokens added per second: `requests_per_minute / 60`.
    pub fn refill_rate_per_sec(&self) -> f64 {
        self.requests_per_minute as f64 / 60.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitsConfig {
    #[serde(default = "default_token_bucket")]
    pub token: TokenBucketConfig,
    #[serde(default = "default_authorize_bucket")]
    pub authorize: TokenBucketConfig,
    #[serde(default = "default_register_bucket")]
    pub register: TokenBucketConfig,
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        Self {
            token: default_token_bucket(),
            authorize: default_authorize_bucket(),
            register: default_register_bucket(),
        }
    }
}

fn default_token_bucket() -> TokenBucketConfig {
    TokenBucketConfig {
        requests_per_minute: 20,
        burst: 5,
    }
}

fn default_authorize_bucket() -> TokenBucketConfig {
    TokenBucketConfig {
        requests_per_minute: 60,
        burst: 10,
    }
}

fn default_register_bucket() -> TokenBucketConfig {
    TokenBucketConfig {
        requests_per_minute: 5,
        burst: 2,
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default)]
    pub rate_limits: RateLimitsConfig,
}
