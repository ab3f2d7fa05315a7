use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit_bytes() -> usize {
    1024 * 1024
}

/// Transport-layer binding and proxy-trust configuration (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
    #[serde(default)]
    pub trusted_proxies: TrustedProxiesConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit_bytes(),
            trusted_proxies: TrustedProxiesConfig::default(),
        }
    }
}

/// Which upstream peers, if any, are trusted to set client-IP headers.
///
/// Proxy headers are trusted only when the connecting IP falls within one
/// of `cidrs` (or `dangerously_trust_all` is set). When trusted, the
/// configured header is parsed right-to-left, skipping trusted-CIDR hops,
/// to find the first untrusted (client) IP — this defeats header spoofing
/// from an attacker who can only reach the proxy, not the origin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustedProxiesConfig {
    #[serde(default)]
    pub dangerously_trust_all: bool,
    #[serde(default)]
    pub cidrs: Vec<String>,
    #[serde(default = "default_real_ip_header")]
    pub real_ip_header: String,
}

fn default_real_ip_header() -> String {
    "X-Forwarded-For".to_string()
}

impl TrustedProxiesConfig {
    pub fn parsed_cidrs(&self) -> Vec<IpNet> {
        self.cidrs
            .iter()
            .filter_map(|cidr| {
                cidr.parse::<IpNet>().ok().or_else(|| {
                    tracing::warn!(cidr = %cidr, "invalid CIDR in trusted_proxies config, skipping");
                    None
                })
            })
            .collect()
    }

    pub fn is_trusted_ip(&self, ip: IpAddr, parsed_cidrs: &[IpNet]) -> bool {
        if self.dangerously_trust_all {
            return true;
        }
        parsed_cidrs.iter().any(|cidr| cidr.contains(&ip))
    }

    pub fn is_configured(&self) -> bool {
        self.dangerously_trust_all || !self.cidrs.is_empty()
    }
}
