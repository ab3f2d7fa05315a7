//! Subject identifier computation (§4.5).

use base64::Engine;
use sha2::{Digest, Sha256};

use crate::models::SubjectType;

/// `sub = base64url(SHA-256(wallet_id || [client_id if pairwise] || subject_salt))`.
///
/// Pairwise subjects differ across clients for the same wallet; public
/// subjects do not.
pub fn compute_subject(
    subject_type: SubjectType,
    wallet_id: &str,
    client_id: &str,
    subject_salt: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(wallet_id.as_bytes());
    if subject_type == SubjectType::Pairwise {
        hasher.update(client_id.as_bytes());
    }
    hasher.update(subject_salt.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_subject_stable_across_clients() {
        let a = compute_subject(SubjectType::Public, "w1", "client-a", "salt");
        let b = compute_subject(SubjectType::Public, "w1", "client-b", "salt");
        assert_eq!(a, b);
    }

    #[test]
    fn pairwise_subject_differs_across_clients() {
        let a = compute_subject(SubjectType::Pairwise, "w1", "client-a", "salt");
        let b = compute_subject(SubjectType::Pairwise, "w1", "client-b", "salt");
        assert_ne!(a, b);
    }

    #[test]
    fn pairwise_subject_stable_for_same_client() {
        let a = compute_subject(SubjectType::Pairwise, "w1", "client-a", "salt");
        let b = compute_subject(SubjectType::Pairwise, "w1", "client-a", "salt");
        assert_eq!(a, b);
    }

    #[test]
    fn different_wallets_produce_different_subjects() {
        let a = compute_subject(SubjectType::Public, "w1", "client-a", "salt");
        let b = compute_subject(SubjectType::Public, "w2", "client-a", "salt");
        assert_ne!(a, b);
    }
}
