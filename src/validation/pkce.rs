use base64::Engine;
use sha2::{Digest, Sha256};

use crate::models::CodeChallengeMethod;

/// `CreateCodeChallenge` (§4.1 step 7): `S256` hashes and base64url-encodes
/// the verifier; `plain` returns the verifier unchanged.
pub fn create_code_challenge(method: CodeChallengeMethod, verifier: &str) -> String {
    match method {
        CodeChallengeMethod::Plain => verifier.to_string(),
        CodeChallengeMethod::S256 => {
            let mut hasher = Sha256::new();
            hasher.update(verifier.as_bytes());
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize())
        }
    }
}

/// `ValidatePKCE` (§4.1 step 7): byte-for-byte comparison against the
/// recorded challenge.
pub fn validate_pkce(verifier: &str, recorded_challenge: &str, method: CodeChallengeMethod) -> bool {
    create_code_challenge(method, verifier) == recorded_challenge
}

pub fn parse_code_challenge_method(s: &str) -> Option<CodeChallengeMethod> {
    match s {
        "S256" => Some(CodeChallengeMethod::S256),
        "plain" => Some(CodeChallengeMethod::Plain),
        _ => None,
    }
}
