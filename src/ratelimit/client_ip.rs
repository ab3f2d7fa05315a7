use std::net::IpAddr;

use axum::extract::connect_info::ConnectInfo;
use axum::http::HeaderMap;

use crate::config::TrustedProxiesConfig;

/// Derives the remote IP the way a reverse-proxy-aware service does: the
/// directly connecting socket address by default, or — when the connecting
/// address falls within a configured trusted-proxy CIDR — the
/// right-to-left-parsed `X-Forwarded-For` client hop (§4.7).
pub fn extract_client_ip(
    headers: &HeaderMap,
    connecting_addr: Option<std::net::SocketAddr>,
    trusted_proxies: &TrustedProxiesConfig,
) -> Option<IpAddr> {
    let connecting_ip = connecting_addr.map(|addr| addr.ip());

    if !trusted_proxies.is_configured() {
        return connecting_ip;
    }

    let parsed_cidrs = trusted_proxies.parsed_cidrs();

    let should_trust_headers = match connecting_ip {
        Some(ip) => trusted_proxies.is_trusted_ip(ip, &parsed_cidrs),
        None => trusted_proxies.dangerously_trust_all,
    };

    if !should_trust_headers {
        return connecting_ip;
    }

    if let Some(ip) = extract_ip_from_xff(headers, trusted_proxies, &parsed_cidrs) {
        return Some(ip);
    }

    if let Some(header_value) = headers.get("X-Real-IP") {
        if let Ok(header_str) = header_value.to_str() {
            if let Ok(ip) = header_str.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }

    connecting_ip
}

/// Parses the trusted-proxy header right-to-left, skipping hops within a
/// trusted CIDR, to find the first untrusted (client) IP. This defeats the
/// classic spoofing attack where an attacker prepends a fake IP before the
/// header reaches the first trusted proxy.
fn extract_ip_from_xff(
    headers: &HeaderMap,
    trusted_proxies: &TrustedProxiesConfig,
    parsed_cidrs: &[ipnet::IpNet],
) -> Option<IpAddr> {
    let header_value = headers.get(&trusted_proxies.real_ip_header)?;
    let header_str = header_value.to_str().ok()?;

    let ips: Vec<IpAddr> = header_str
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    if ips.is_empty() {
        return None;
    }

    if trusted_proxies.dangerously_trust_all {
        return ips.into_iter().next();
    }

    ips.into_iter()
        .rev()
        .find(|&ip| !trusted_proxies.is_trusted_ip(ip, parsed_cidrs))
}

/// Extracts from a live request's extensions + headers in one step, for use
/// from axum middleware.
pub fn extract_client_ip_from_request(
    req: &axum::extract::Request,
    trusted_proxies: &TrustedProxiesConfig,
) -> Option<IpAddr> {
    let connecting_addr = req
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0);
    extract_client_ip(req.headers(), connecting_addr, trusted_proxies)
}
