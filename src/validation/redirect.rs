use crate::models::Client;

/// `ValidateRedirectURI` (§4.8): exact-match against the client's registered
/// set. Never prefix or regex matching.
pub fn validate_redirect_uri(client: &Client, redirect_uri: &str) -> bool {
    client.allows_redirect_uri(redirect_uri)
}
