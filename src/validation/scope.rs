/// `ValidateScopes` (§4.8): every requested scope must lie within the
/// allow-list.
pub fn validate_scopes(requested: &[String], allowed: &[String]) -> bool {
    requested.iter().all(|s| allowed.iter().any(|a| a == s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_is_allowed() {
        let allowed = vec!["openid".to_string(), "pid".to_string()];
        let requested = vec!["openid".to_string()];
        assert!(validate_scopes(&requested, &allowed));
    }

    #[test]
    fn unknown_scope_rejected() {
        let allowed = vec!["openid".to_string()];
        let requested = vec!["openid".to_string(), "admin".to_string()];
        assert!(!validate_scopes(&requested, &allowed));
    }

    #[test]
    fn empty_request_is_allowed() {
        let allowed = vec!["openid".to_string()];
        assert!(validate_scopes(&[], &allowed));
    }
}
