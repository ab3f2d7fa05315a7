use serde::Deserialize;
use validator::Validate;

use crate::validation::validate_https_uri;

use super::error::RegistrationError;

/// Raw registration payload (§4.4). Every field besides `redirect_uris` is
/// optional so the same shape serves both `POST /register` (defaults
/// applied) and `PUT /register/{client_id}` (absent fields preserved).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ClientMetadataInput {
    pub redirect_uris: Option<Vec<String>>,
    pub token_endpoint_auth_method: Option<String>,
    pub grant_types: Option<Vec<String>>,
    pub response_types: Option<Vec<String>>,
    #[validate(length(max = 255))]
    pub scope: Option<String>,
    pub subject_type: Option<String>,
    pub code_challenge_method: Option<String>,
    pub jwks: Option<serde_json::Value>,
    pub jwks_uri: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub client_name: Option<String>,
    pub client_uri: Option<String>,
    pub logo_uri: Option<String>,
    pub contacts: Option<Vec<String>>,
    pub tos_uri: Option<String>,
    pub policy_uri: Option<String>,
}

const AUTH_METHODS: &[&str] = &[
    "client_secret_basic",
    "client_secret_post",
    "client_secret_jwt",
    "private_key_jwt",
    "none",
];
const GRANT_TYPES: &[&str] = &["authorization_code", "refresh_token"];
const RESPONSE_TYPES: &[&str] = &["code"];
const SUBJECT_TYPES: &[&str] = &["public", "pairwise"];
const CODE_CHALLENGE_METHODS: &[&str] = &["S256", "plain"];

/// `ValidateRegistration` (§4.4): shape and enum-membership checks shared by
/// create and update. Does not touch the store.
pub fn validate_registration(
    input: &ClientMetadataInput,
    redirect_uris_required: bool,
) -> Result<(), RegistrationError> {
    input
        .validate()
        .map_err(|e| RegistrationError::InvalidClientMetadata(e.to_string()))?;

    match &input.redirect_uris {
        Some(uris) => {
            if uris.is_empty() {
                return Err(RegistrationError::InvalidClientMetadata(
                    "redirect_uris must not be empty".into(),
                ));
            }
            for uri in uris {
                let parsed = url::Url::parse(uri).map_err(|_| {
                    RegistrationError::InvalidClientMetadata(format!("invalid redirect_uri: {uri}"))
                })?;
                if parsed.fragment().is_some() {
                    return Err(RegistrationError::InvalidClientMetadata(
                        "redirect_uri must not contain a fragment".into(),
                    ));
                }
            }
        }
        None if redirect_uris_required => {
            return Err(RegistrationError::InvalidClientMetadata(
                "redirect_uris is required".into(),
            ));
        }
        None => {}
    }

    check_enum(
        input.token_endpoint_auth_method.as_deref(),
        AUTH_METHODS,
        "token_endpoint_auth_method",
    )?;
    check_enum_list(input.grant_types.as_deref(), GRANT_TYPES, "grant_types")?;
    check_enum_list(input.response_types.as_deref(), RESPONSE_TYPES, "response_types")?;
    check_enum(input.subject_type.as_deref(), SUBJECT_TYPES, "subject_type")?;
    check_enum(
        input.code_challenge_method.as_deref(),
        CODE_CHALLENGE_METHODS,
        "code_challenge_method",
    )?;

    if input.jwks.is_some() && input.jwks_uri.is_some() {
        return Err(RegistrationError::InvalidClientMetadata(
            "jwks and jwks_uri are mutually exclusive".into(),
        ));
    }

    for (name, uri) in [
        ("logo_uri", &input.logo_uri),
        ("client_uri", &input.client_uri),
        ("policy_uri", &input.policy_uri),
        ("tos_uri", &input.tos_uri),
    ] {
        if let Some(uri) = uri {
            if !validate_https_uri(uri) {
                return Err(RegistrationError::InvalidClientMetadata(format!(
                    "{name} must be an https URL with a host and no fragment"
                )));
            }
        }
    }

    Ok(())
}

fn check_enum(value: Option<&str>, allowed: &[&str], field: &str) -> Result<(), RegistrationError> {
    if let Some(value) = value {
        if !allowed.contains(&value) {
            return Err(RegistrationError::InvalidClientMetadata(format!(
                "{field} must be one of {allowed:?}"
            )));
        }
    }
    Ok(())
}

fn check_enum_list(
    values: Option<&[String]>,
    allowed: &[&str],
    field: &str,
) -> Result<(), RegistrationError> {
    if let Some(values) = values {
        for value in values {
            if !allowed.contains(&value.as_str()) {
                return Err(RegistrationError::InvalidClientMetadata(format!(
                    "{field} must be a subset of {allowed:?}"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> ClientMetadataInput {
        ClientMetadataInput {
            redirect_uris: Some(vec!["https://rp.example/cb".into()]),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_input_is_valid() {
        assert!(validate_registration(&valid_input(), true).is_ok());
    }

    #[test]
    fn missing_redirect_uris_rejected_when_required() {
        let input = ClientMetadataInput::default();
        assert!(validate_registration(&input, true).is_err());
    }

    #[test]
    fn missing_redirect_uris_allowed_on_update() {
        let input = ClientMetadataInput::default();
        assert!(validate_registration(&input, false).is_ok());
    }

    #[test]
    fn unknown_auth_method_rejected() {
        let mut input = valid_input();
        input.token_endpoint_auth_method = Some("bearer".into());
        assert!(validate_registration(&input, true).is_err());
    }

    #[test]
    fn fragment_in_redirect_uri_rejected() {
        let mut input = valid_input();
        input.redirect_uris = Some(vec!["https://rp.example/cb#frag".into()]);
        assert!(validate_registration(&input, true).is_err());
    }

    #[test]
    fn jwks_and_jwks_uri_together_rejected() {
        let mut input = valid_input();
        input.jwks = Some(serde_json::json!({"keys": []}));
        input.jwks_uri = Some("https://rp.example/jwks".into());
        assert!(validate_registration(&input, true).is_err());
    }

    #[test]
    fn non_https_logo_uri_rejected() {
        let mut input = valid_input();
        input.logo_uri = Some("http://rp.example/logo.png".into());
        assert!(validate_registration(&input, true).is_err());
    }

    #[test]
    fn empty_client_name_rejected() {
        let mut input = valid_input();
        input.client_name = Some(String::new());
        assert!(validate_registration(&input, true).is_err());
    }
}
