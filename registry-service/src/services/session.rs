//! Session token codec.
//!
//! Tokens are HS256 JWTs carrying the caller's identity. Nothing is stored
//! server side: a token is valid as long as its signature checks out and its
//! `exp` has not passed. Without a configured secret the key is generated at
//! startup, so a restart invalidates every outstanding token.

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Identity;

/// Issuer claim on every session token.
pub const TOKEN_ISSUER: &str = "Registry";

/// Size of a generated signing key (512 bits).
pub const GENERATED_SECRET_BYTES: usize = 64;

/// Minimum size accepted for an operator supplied key (256 bits).
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    Expired,

    #[error("Unsupported signature algorithm")]
    UnsupportedAlgorithm,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(flatten)]
    identity: Identity,
    iss: String,
    exp: i64,
}

/// Issues and verifies session tokens with a process-wide secret.
#[derive(Clone)]
pub struct SessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionService {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Key drawn from the OS CSPRNG, held only in memory.
    pub fn with_random_secret() -> Self {
        let mut secret = [0u8; GENERATED_SECRET_BYTES];
        OsRng.fill_bytes(&mut secret);
        Self::new(&secret)
    }

    pub fn issue(&self, identity: &Identity, expires_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = SessionClaims {
            identity: identity.clone(),
            iss: TOKEN_ISSUER.to_string(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Signature and algorithm are checked before any claim is trusted.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.identity)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidAlgorithm => TokenError::UnsupportedAlgorithm,
                _ => TokenError::InvalidToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Duration;

    fn identity() -> Identity {
        Identity {
            id: 7,
            role: Role::Admin,
            display_name: "Ada".to_string(),
        }
    }

    #[test]
    fn test_issue_then_verify_returns_identity() {
        let sessions = SessionService::new(b"an-example-secret-of-thirty-two-bytes!!");
        let token = sessions
            .issue(&identity(), Utc::now() + Duration::minutes(15))
            .unwrap();

        assert_eq!(sessions.verify(&token).unwrap(), identity());
    }

    #[test]
    fn test_expired_token_is_rejected_as_expired() {
        let sessions = SessionService::with_random_secret();
        let token = sessions
            .issue(&identity(), Utc::now() - Duration::seconds(5))
            .unwrap();

        assert!(matches!(sessions.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_token_from_other_secret_is_invalid() {
        let ours = SessionService::with_random_secret();
        let theirs = SessionService::with_random_secret();
        let token = theirs
            .issue(&identity(), Utc::now() + Duration::hours(1))
            .unwrap();

        assert!(matches!(ours.verify(&token), Err(TokenError::InvalidToken)));
    }

    #[test]
    fn test_other_algorithm_is_unsupported() {
        let secret = b"an-example-secret-of-thirty-two-bytes!!";
        let sessions = SessionService::new(secret);
        let claims = SessionClaims {
            identity: identity(),
            iss: TOKEN_ISSUER.to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap();

        assert!(matches!(
            sessions.verify(&token),
            Err(TokenError::UnsupportedAlgorithm)
        ));
    }

    #[test]
    fn test_unsigned_token_is_rejected() {
        let sessions = SessionService::with_random_secret();
        // {"alg":"none","typ":"JWT"}.{"id":1,"role":"ROLE_OWNER","name":"x","iss":"Registry","exp":9999999999}.
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJpZCI6MSwicm9sZSI6IlJPTEVfT1dORVIiLCJuYW1lIjoieCIsImlzcyI6IlJlZ2lzdHJ5IiwiZXhwIjo5OTk5OTk5OTk5fQ.";

        assert!(sessions.verify(token).is_err());
    }

    #[test]
    fn test_wrong_issuer_is_invalid() {
        let secret = b"an-example-secret-of-thirty-two-bytes!!";
        let sessions = SessionService::new(secret);
        let claims = SessionClaims {
            identity: identity(),
            iss: "Elsewhere".to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap();

        assert!(matches!(sessions.verify(&token), Err(TokenError::InvalidToken)));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let sessions = SessionService::with_random_secret();
        assert!(matches!(
            sessions.verify("not-a-token"),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn test_claims_use_wire_names() {
        let claims = SessionClaims {
            identity: identity(),
            iss: TOKEN_ISSUER.to_string(),
            exp: 1,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["role"], "ROLE_ADMIN");
        assert_eq!(value["name"], "Ada");
        assert_eq!(value["iss"], "Registry");
    }
}
