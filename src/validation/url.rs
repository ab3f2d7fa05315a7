//! URL validation for SSRF protection.
//!
//! Validates trust-sensitive URLs (e.g. `jwks_uri`) before the server makes
//! outbound HTTP requests to them. Blocks private/internal IP ranges,
//! non-HTTP schemes, and cloud metadata endpoints.

use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};

#[derive(Debug, thiserror::Error)]
pub enum UrlValidationError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("URL scheme must be http or https")]
    InvalidScheme,
    #[error("URL must include a hostname")]
    MissingHost,
    #[error("URL resolves to a blocked address")]
    BlockedAddress,
}

fn is_blocked_ip(ip: IpAddr, allow_loopback: bool) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            if v4.is_loopback() {
                return !allow_loopback;
            }
            if v4.is_private() {
                return true;
            }
            if v4.is_link_local() {
                return true;
            }
            if v4 == Ipv4Addr::new(169, 254, 169, 254) {
                return true; // cloud metadata, blocked even with allow_loopback
            }
            if v4.is_broadcast() {
                return true;
            }
            if v4.is_unspecified() {
                return true;
            }
            false
        }
        IpAddr::V6(v6) => {
            if v6.is_loopback() {
                return !allow_loopback;
            }
            if v6.is_unspecified() {
                return true;
            }
            let segments = v6.segments();
            if segments[0] & 0xffc0 == 0xfe80 {
                return true; // link-local fe80::/10
            }
            if segments[0] & 0xfe00 == 0xfc00 {
                return true; // unique local fc00::/7
            }
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_blocked_ip(IpAddr::V4(v4), allow_loopback);
            }
            false
        }
    }
}

/// `ValidateURI` (§4.8): blocks localhost, loopback, link-local, and private
/// ranges after DNS resolution. Used for trust-sensitive outbound lookups
/// such as a client's `jwks_uri`.
pub fn validate_uri(url: &str, allow_loopback: bool) -> Result<(), UrlValidationError> {
    let parsed = url::Url::parse(url).map_err(|e| UrlValidationError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::InvalidScheme),
    }

    let host = parsed.host_str().ok_or(UrlValidationError::MissingHost)?;

    if !allow_loopback
        && (host.eq_ignore_ascii_case("localhost")
            || host.eq_ignore_ascii_case("localhost.localdomain"))
    {
        return Err(UrlValidationError::BlockedAddress);
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_blocked_ip(ip, allow_loopback) {
            return Err(UrlValidationError::BlockedAddress);
        }
        return Ok(());
    }

    let port = parsed.port().unwrap_or(match parsed.scheme() {
        "https" => 443,
        _ => 80,
    });

    let socket_addrs: Vec<_> = format!("{host}:{port}")
        .to_socket_addrs()
        .map_err(|e| UrlValidationError::InvalidUrl(format!("DNS resolution failed: {e}")))?
        .collect();

    if socket_addrs.is_empty() {
        return Err(UrlValidationError::InvalidUrl(
            "hostname did not resolve to any addresses".to_string(),
        ));
    }

    for addr in &socket_addrs {
        if is_blocked_ip(addr.ip(), allow_loopback) {
            return Err(UrlValidationError::BlockedAddress);
        }
    }

    Ok(())
}
