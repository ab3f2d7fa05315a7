mod generate;
mod hash;
mod signing;

pub use generate::{
    generate_authorization_code, generate_client_id, generate_client_secret,
    generate_request_object_nonce, generate_session_id, generate_token, hash_token_sha256,
};
pub use hash::{hash_client_secret, verify_client_secret, verify_registration_token, HashError};
pub use signing::{parse_signing_alg, SigningError, SigningKey};
