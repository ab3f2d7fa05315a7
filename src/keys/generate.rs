use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a hex-encoded random identifier with at least `bits` bits of entropy.
/// Used for session IDs (>=128 bits) and request-object/PKCE-unrelated nonces.
pub fn generate_hex_id(bits: usize) -> String {
    let bytes = bits.div_ceil(8);
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill(buf.as_mut_slice());
    hex::encode(buf)
}

/// Generate a URL-safe base64 (no padding) random token with at least `bits`
/// bits of entropy. Used for authorization codes, access/refresh tokens,
/// client secrets, and registration access tokens.
pub fn generate_b64_token(bits: usize) -> String {
    let bytes = bits.div_ceil(8);
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill(buf.as_mut_slice());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

/// A session_id with >=128 bits of entropy, hex-encoded (§4.1 Authorize step 6).
pub fn generate_session_id() -> String {
    generate_hex_id(128)
}

/// A request-object nonce with >=128 bits of entropy.
pub fn generate_request_object_nonce() -> String {
    generate_hex_id(128)
}

/// A one-shot authorization code with >=128 bits of entropy.
pub fn generate_authorization_code() -> String {
    generate_b64_token(128)
}

/// An access or refresh token with >=256 bits of entropy.
pub fn generate_token() -> String {
    generate_b64_token(256)
}

/// A 128-bit hex `client_id`, per §4.4 registration.
pub fn generate_client_id() -> String {
    generate_hex_id(128)
}

/// A >=256-bit base64url client secret or registration access token.
pub fn generate_client_secret() -> String {
    generate_b64_token(256)
}

/// Hex-encoded SHA-256 of a high-entropy bearer token (registration access
/// token). Fast-verify is acceptable because the token itself is >=256 bits.
pub fn hash_token_sha256(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use subtle::ConstantTimeEq;

    #[test]
    fn hex_id_has_requested_length() {
        // 128 bits = 16 bytes = 32 hex chars
        assert_eq!(generate_session_id().len(), 32);
    }

    #[test]
    fn b64_token_has_no_padding() {
        let token = generate_token();
        assert!(!token.contains('='));
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(generate_session_id(), generate_session_id());
        assert_ne!(generate_authorization_code(), generate_authorization_code());
    }

    #[test]
    fn hash_is_deterministic_and_hex() {
        let h1 = hash_token_sha256("a-token");
        let h2 = hash_token_sha256("a-token");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_tokens_hash_differently() {
        let h1 = hash_token_sha256("token-a");
        let h2 = hash_token_sha256("token-b");
        assert_ne!(
            h1.as_bytes().ct_eq(h2.as_bytes()).unwrap_u8(),
            1,
            "distinct tokens must not hash equal"
        );
    }
}
