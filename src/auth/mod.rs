pub mod password;
pub mod policy;

use bson::oid::ObjectId;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ApiError;
pub use policy::Role;

/// Token payload: the user id (hex) and role, plus the standard timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: ObjectId, role: Role, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            user_id: user_id.to_hex(),
            role,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret is not configured")]
    SecretMissing,
    #[error("JWT generation error: {0}")]
    TokenGeneration(jsonwebtoken::errors::Error),
    #[error("token has expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::SecretMissing => {
                ApiError::internal("JWT_SECRET_MISSING", "JWT secret is not configured")
            }
            JwtError::TokenGeneration(e) => {
                ApiError::internal("INTERNAL_SERVER_ERROR", "Failed to generate token").with_cause(e)
            }
            JwtError::Expired => ApiError::unauthorized("TOKEN_EXPIRED", "Token has expired"),
            JwtError::Invalid(e) => {
                ApiError::unauthorized("JWT_INVALID", "Invalid or malformed token").with_cause(e)
            }
        }
    }
}

/// Issues and verifies HS256 session tokens with the server-held secret
#[derive(Clone)]
pub struct JwtSigner {
    secret: String,
    expiry_hours: u64,
}

impl JwtSigner {
    pub fn new(secret: impl Into<String>, expiry_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            expiry_hours,
        }
    }

    pub fn issue(&self, user_id: ObjectId, role: Role) -> Result<String, JwtError> {
        self.encode(&Claims::new(user_id, role, self.expiry_hours))
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::SecretMissing);
        }

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::default(), claims, &encoding_key).map_err(JwtError::TokenGeneration)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::SecretMissing);
        }

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        decode::<Claims>(token, &decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e),
            })
    }
}

impl std::fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSigner")
            .field("expiry_hours", &self.expiry_hours)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let signer = JwtSigner::new("test-secret", 168);
        let id = ObjectId::new();
        let token = signer.issue(id, Role::Admin).unwrap();

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.user_id, id.to_hex());
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 168 * 3600);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = JwtSigner::new("one", 1).issue(ObjectId::new(), Role::Client).unwrap();
        let err = JwtSigner::new("two", 1).verify(&token).unwrap_err();
        assert!(matches!(err, JwtError::Invalid(_)));
        assert_eq!(ApiError::from(err).code(), "JWT_INVALID");
    }

    #[test]
    fn expired_token_is_reported() {
        let signer = JwtSigner::new("test-secret", 1);
        let mut claims = Claims::new(ObjectId::new(), Role::Client, 1);
        claims.iat -= 3 * 3600;
        claims.exp = claims.iat + 3600;
        let token = signer.encode(&claims).unwrap();

        let err = ApiError::from(signer.verify(&token).unwrap_err());
        assert_eq!(err.code(), "TOKEN_EXPIRED");
    }

    #[test]
    fn empty_secret_is_a_server_error() {
        let signer = JwtSigner::new("", 1);
        let err = ApiError::from(signer.issue(ObjectId::new(), Role::Client).unwrap_err());
        assert_eq!(err.code(), "JWT_SECRET_MISSING");
        assert!(err.status().is_server_error());
    }
}
