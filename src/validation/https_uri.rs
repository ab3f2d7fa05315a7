/// `ValidateHTTPSURI` (§4.8): scheme=https, non-empty host, no fragment.
/// Used for client metadata URIs (logo/client/policy/tos) at registration.
pub fn validate_https_uri(uri: &str) -> bool {
    let Ok(parsed) = url::Url::parse(uri) else {
        return false;
    };
    parsed.scheme() == "https"
        && parsed.host_str().is_some_and(|h| !h.is_empty())
        && parsed.fragment().is_none()
}
