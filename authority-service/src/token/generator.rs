//! C1 — Signed Access Generator (§4.1).
//!
//! Produces the signed access credential (claims: `jti`, `exp`, `sub`) and
//! derives the opaque refresh token. Signing algorithm is fixed at
//! construction from the configured family {HMAC, RSA, ECDSA}; verification
//! uses a separate decoding key when one is configured, falling back to the
//! signing key for the symmetric families.

use base64::engine::general_purpose::URL_SAFE as BASE64_URL_SAFE;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::errors::ApiError;
use std::collections::HashMap;
use uuid::Uuid;

use shared::config::{JwtConfig, SigningAlgorithm};

impl From<SigningAlgorithm> for Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::HS256 => Algorithm::HS256,
            SigningAlgorithm::HS384 => Algorithm::HS384,
            SigningAlgorithm::HS512 => Algorithm::HS512,
            SigningAlgorithm::RS256 => Algorithm::RS256,
            SigningAlgorithm::RS384 => Algorithm::RS384,
            SigningAlgorithm::RS512 => Algorithm::RS512,
            SigningAlgorithm::PS256 => Algorithm::PS256,
            SigningAlgorithm::PS384 => Algorithm::PS384,
            SigningAlgorithm::PS512 => Algorithm::PS512,
            SigningAlgorithm::ES256 => Algorithm::ES256,
            SigningAlgorithm::ES384 => Algorithm::ES384,
        }
    }
}

/// Claims carried by the signed access token (§6 "Signed token format").
///
/// `jti` deliberately carries the same identifier `GenerateAccessToken` was
/// called with — `user_id` at the Manager boundary — not the store's
/// `basic_id`; see DESIGN.md's Open Question 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub jti: String,
    pub exp: i64,
    /// JSON-serialized `other_info` map.
    pub sub: String,
}

impl AccessClaims {
    pub fn other_info(&self) -> HashMap<String, String> {
        serde_json::from_str(&self.sub).unwrap_or_default()
    }
}

/// Parameters for minting one access (and optionally refresh) token.
pub struct GenerateBasic<'a> {
    pub jti: &'a str,
    pub expires_at: DateTime<Utc>,
    pub other_info: Option<&'a HashMap<String, String>>,
}

/// Pluggable signer for one algorithm family, held immutable for the
/// process lifetime.
pub struct SignedAccessGenerator {
    algorithm: Algorithm,
    key_id: Option<String>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SignedAccessGenerator {
    /// Builds the signer from configuration. Fails on an unparseable key —
    /// PEM for RSA/ECDSA families, raw bytes for HMAC.
    pub fn new(config: &JwtConfig) -> Result<Self, ApiError> {
        let algorithm: Algorithm = config.algorithm.into();
        let key_bytes = config.jwt_key.as_bytes();
        let pub_bytes = config.jwt_public_key.as_deref().map(str::as_bytes);

        let (encoding_key, decoding_key) = match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => (
                EncodingKey::from_secret(key_bytes),
                DecodingKey::from_secret(pub_bytes.unwrap_or(key_bytes)),
            ),
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512
            | Algorithm::PS256 | Algorithm::PS384 | Algorithm::PS512 => {
                let enc = EncodingKey::from_rsa_pem(key_bytes)
                    .map_err(|e| ApiError::internal(format!("invalid RSA private key: {e}")))?;
                let dec = DecodingKey::from_rsa_pem(pub_bytes.unwrap_or(key_bytes))
                    .map_err(|e| ApiError::internal(format!("invalid RSA public key: {e}")))?;
                (enc, dec)
            }
            Algorithm::ES256 | Algorithm::ES384 => {
                let enc = EncodingKey::from_ec_pem(key_bytes)
                    .map_err(|e| ApiError::internal(format!("invalid EC private key: {e}")))?;
                let dec = DecodingKey::from_ec_pem(pub_bytes.unwrap_or(key_bytes))
                    .map_err(|e| ApiError::internal(format!("invalid EC public key: {e}")))?;
                (enc, dec)
            }
            other => return Err(ApiError::internal(format!("unsupported sign method: {other:?}"))),
        };

        Ok(Self {
            algorithm,
            key_id: config.key_id.clone(),
            encoding_key,
            decoding_key,
        })
    }

    /// Signs an access token and, if requested, derives a refresh token from
    /// it: a UUIDv5 over a freshly random namespace using the access token
    /// as name, base64-url-encoded, upper-cased, with padding stripped.
    pub fn token(&self, basic: &GenerateBasic<'_>, generate_refresh: bool) -> Result<(String, String), ApiError> {
        let sub = match basic.other_info {
            Some(map) => serde_json::to_string(map)?,
            None => String::new(),
        };
        let claims = AccessClaims {
            jti: basic.jti.to_string(),
            exp: basic.expires_at.timestamp(),
            sub,
        };

        let mut header = Header::new(self.algorithm);
        header.kid = self.key_id.clone();

        let access = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| ApiError::internal(format!("token signing failed: {e}")))?;

        let refresh = if generate_refresh {
            let namespace = Uuid::new_v4();
            let raw = Uuid::new_v5(&namespace, access.as_bytes());
            let encoded = BASE64_URL_SAFE.encode(raw.as_bytes());
            encoded.trim_end_matches('=').to_uppercase()
        } else {
            String::new()
        };

        Ok((access, refresh))
    }

    /// Signature + claims verification only — no store lookup. Failure modes
    /// (unsupported algorithm, key mismatch, bad signature, expired `exp`)
    /// all collapse into `ApiError::InvalidAccessToken` at this boundary.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, ApiError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        let data = decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| ApiError::InvalidAccessToken)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::config::JwtConfig;

    fn hs256_config() -> JwtConfig {
        JwtConfig {
            access_token_exp: 2,
            refresh_token_exp: 24,
            algorithm: SigningAlgorithm::HS256,
            jwt_key: "test-secret-key-at-least-this-long".to_string(),
            jwt_public_key: None,
            key_id: Some("k1".to_string()),
            server_host: String::new(),
            generate_refresh: true,
        }
    }

    #[test]
    fn round_trip_sign_and_verify() {
        let gen = SignedAccessGenerator::new(&hs256_config()).unwrap();
        let basic = GenerateBasic {
            jti: "user-42",
            expires_at: Utc::now() + chrono::Duration::hours(1),
            other_info: None,
        };
        let (access, refresh) = gen.token(&basic, true).unwrap();
        assert!(!refresh.is_empty());
        assert!(refresh.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_'));

        let claims = gen.verify(&access).unwrap();
        assert_eq!(claims.jti, "user-42");
    }

    #[test]
    fn expired_token_fails_verification() {
        let gen = SignedAccessGenerator::new(&hs256_config()).unwrap();
        let basic = GenerateBasic {
            jti: "user-42",
            expires_at: Utc::now() - chrono::Duration::hours(1),
            other_info: None,
        };
        let (access, _) = gen.token(&basic, false).unwrap();
        assert!(matches!(gen.verify(&access), Err(ApiError::InvalidAccessToken)));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let gen_a = SignedAccessGenerator::new(&hs256_config()).unwrap();
        let mut other_cfg = hs256_config();
        other_cfg.jwt_key = "a-totally-different-secret-key".to_string();
        let gen_b = SignedAccessGenerator::new(&other_cfg).unwrap();

        let basic = GenerateBasic {
            jti: "user-42",
            expires_at: Utc::now() + chrono::Duration::hours(1),
            other_info: None,
        };
        let (access, _) = gen_a.token(&basic, false).unwrap();
        assert!(matches!(gen_b.verify(&access), Err(ApiError::InvalidAccessToken)));
    }

    #[test]
    fn other_info_round_trips_through_sub_claim() {
        let gen = SignedAccessGenerator::new(&hs256_config()).unwrap();
        let mut info = HashMap::new();
        info.insert("Department-Id".to_string(), "1,2|3".to_string());
        let basic = GenerateBasic {
            jti: "user-42",
            expires_at: Utc::now() + chrono::Duration::hours(1),
            other_info: Some(&info),
        };
        let (access, _) = gen.token(&basic, false).unwrap();
        let claims = gen.verify(&access).unwrap();
        assert_eq!(claims.other_info(), info);
    }
}
