use base64::Engine;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("failed to read signing key at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("signing key is not valid PKCS1/PKCS8 PEM for algorithm {0:?}")]
    InvalidKey(Algorithm),
    #[error("failed to sign token: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Parse a configured `oidc.signing_alg` string into a jsonwebtoken `Algorithm`.
/// Defaults (and falls back) to RS256 per §6.
pub fn parse_signing_alg(alg: &str) -> Result<Algorithm, SigningError> {
    match alg {
        "RS256" => Ok(Algorithm::RS256),
        "RS384" => Ok(Algorithm::RS384),
        "RS512" => Ok(Algorithm::RS512),
        "ES256" => Ok(Algorithm::ES256),
        "ES384" => Ok(Algorithm::ES384),
        "ES512" => Err(SigningError::UnsupportedAlgorithm(
            "ES512 is not exposed by the jsonwebtoken crate's Algorithm enum".into(),
        )),
        other => Err(SigningError::UnsupportedAlgorithm(other.to_string())),
    }
}

/// The process-lifetime OIDC signing key: loaded once at startup, read-mostly,
/// never mutated at runtime (§5).
pub struct SigningKey {
    alg: Algorithm,
    encoding_key: EncodingKey,
    /// Only populated for RSA algorithms; used to publish JWKS (§4.1 JWKS).
    rsa_public: Option<(Vec<u8>, Vec<u8>)>, // (n, e) big-endian bytes
}

impl SigningKey {
    pub fn load(path: &str, alg: Algorithm) -> Result<Self, SigningError> {
        let pem = std::fs::read_to_string(path).map_err(|source| SigningError::Io {
            path: path.to_string(),
            source,
        })?;

        let (encoding_key, rsa_public) = match alg {
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => {
                let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|_| SigningError::InvalidKey(alg))?;
                let private = RsaPrivateKey::from_pkcs1_pem(&pem)
                    .or_else(|_| RsaPrivateKey::from_pkcs8_pem(&pem))
                    .map_err(|_| SigningError::InvalidKey(alg))?;
                let public = private.to_public_key();
                let n = public.n().to_bytes_be();
                let e = public.e().to_bytes_be();
                (encoding_key, Some((n, e)))
            }
            Algorithm::ES256 | Algorithm::ES384 => {
                let encoding_key = EncodingKey::from_ec_pem(pem.as_bytes())
                    .map_err(|_| SigningError::InvalidKey(alg))?;
                (encoding_key, None)
            }
            other => return Err(SigningError::UnsupportedAlgorithm(format!("{other:?}"))),
        };

        Ok(Self {
            alg,
            encoding_key,
            rsa_public,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.alg
    }

    pub fn algorithm_name(&self) -> &'static str {
        match self.alg {
            Algorithm::RS256 => "RS256",
            Algorithm::RS384 => "RS384",
            Algorithm::RS512 => "RS512",
            Algorithm::ES256 => "ES256",
            Algorithm::ES384 => "ES384",
            _ => "RS256",
        }
    }

    /// Sign an arbitrary claim set with this key's algorithm.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, SigningError> {
        let header = Header::new(self.alg);
        Ok(jsonwebtoken::encode(&header, claims, &self.encoding_key)?)
    }

    /// Render the public half of this key as a JWKS `keys` entry.
    ///
    /// Only RSA keys are representable in the shape §4.1 specifies
    /// (modulus/exponent). An EC-configured deployment still serves a JWKS
    /// document but with an empty `keys` array, since no EC JWK shape is
    /// part of this specification's scope.
    pub fn jwk(&self) -> Option<serde_json::Value> {
        let (n, e) = self.rsa_public.as_ref()?;
        let enc = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        Some(serde_json::json!({
            "kty": "RSA",
            "use": "sig",
            "kid": "default",
            "alg": self.algorithm_name(),
            "n": enc.encode(n),
            "e": enc.encode(e),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rsa_pem() -> String {
        // Generated once for tests; a small key is fine since we never need
        // production-grade security here.
        let mut rng = rand::thread_rng();
        let key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
        use rsa::pkcs1::EncodeRsaPrivateKey;
        key.to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
            .expect("pem encode")
            .to_string()
    }

    #[test]
    fn signs_and_exposes_jwk_for_rsa() {
        let pem = test_rsa_pem();
        let dir = tempfile_path(&pem);
        let key = SigningKey::load(&dir, Algorithm::RS256).unwrap();
        let token = key.sign(&serde_json::json!({"sub": "abc"})).unwrap();
        assert!(!token.is_empty());
        let jwk = key.jwk().expect("rsa key exposes a jwk");
        assert_eq!(jwk["kty"], "RSA");
        assert_eq!(jwk["kid"], "default");
    }

    #[test]
    fn rejects_es512_as_unsupported() {
        assert!(matches!(
            parse_signing_alg("ES512"),
            Err(SigningError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn defaults_are_rs256() {
        assert_eq!(parse_signing_alg("RS256").unwrap(), Algorithm::RS256);
    }

    fn tempfile_path(contents: &str) -> String {
        let path = std::env::temp_dir().join(format!("signing-key-test-{}.pem", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path.to_string_lossy().to_string()
    }
}
