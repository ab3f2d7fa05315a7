use subtle::ConstantTimeEq;

use super::generate::hash_token_sha256;

const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("failed to hash secret: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

/// Hash a client secret with bcrypt at the default cost (§4.3).
pub fn hash_client_secret(secret: &str) -> Result<String, HashError> {
    Ok(bcrypt::hash(secret, BCRYPT_COST)?)
}

/// Constant-time-equivalent bcrypt verification of a presented client secret.
/// bcrypt's own comparison is already constant-time over the hash; no
/// additional masking is needed here.
pub fn verify_client_secret(secret: &str, hash: &str) -> bool {
    bcrypt::verify(secret, hash).unwrap_or(false)
}

/// Verify a presented registration access token against its stored SHA-256
/// hex hash, comparing in constant time to avoid leaking the hash via timing.
pub fn verify_registration_token(presented: &str, stored_hash: &str) -> bool {
    let computed = hash_token_sha256(presented);
    computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}
