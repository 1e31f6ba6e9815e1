//! JWT token generation and validation
//!
//! HS256 bearer tokens carrying the caller identity the route layer injects
//! into the services.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::schemas::UserDoc;
use crate::types::{Result, ToyshopError};

/// Claims embedded in every token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id (hex)
    pub sub: String,
    pub username: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub is_admin: bool,
    /// Issued-at, epoch seconds
    pub iat: u64,
    /// Expiry, epoch seconds
    pub exp: u64,
}

/// Token signer/verifier built once at startup from config
#[derive(Clone)]
pub struct JwtValidator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_seconds: u64,
}

impl JwtValidator {
    pub fn new(secret: &str, expiry_seconds: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        }
    }

    /// Generate a token for a stored user, returning (token, expires_at).
    pub fn generate_token(&self, user: &UserDoc) -> Result<(String, u64)> {
        let user_id = user
            .id
            .ok_or_else(|| ToyshopError::Auth("user has no id".into()))?;

        let now = now_secs();
        let claims = Claims {
            sub: user_id.to_hex(),
            username: user.username.clone(),
            fullname: user.fullname.clone(),
            is_admin: user.is_admin,
            iat: now,
            exp: now + self.expiry_seconds,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ToyshopError::Auth(format!("Failed to sign token: {e}")))?;

        Ok((token, claims.exp))
    }

    /// Verify a token and return its claims. Expired or tampered tokens fail.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| ToyshopError::Auth(format!("Invalid token: {e}")))
    }
}

/// Extract the bearer token from an `Authorization` header value.
pub fn extract_token_from_header(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;

    fn test_user(is_admin: bool) -> UserDoc {
        UserDoc {
            id: Some(ObjectId::new()),
            username: "puki".into(),
            password_hash: String::new(),
            fullname: "Puki Ben David".into(),
            is_admin,
            score: 100,
        }
    }

    #[test]
    fn test_roundtrip() {
        let jwt = JwtValidator::new("test-secret", 3600);
        let user = test_user(true);
        let (token, exp) = jwt.generate_token(&user).unwrap();

        let claims = jwt.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id.unwrap().to_hex());
        assert_eq!(claims.username, "puki");
        assert!(claims.is_admin);
        assert_eq!(claims.exp, exp);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let jwt = JwtValidator::new("secret-a", 3600);
        let (token, _) = jwt.generate_token(&test_user(false)).unwrap();

        let other = JwtValidator::new("secret-b", 3600);
        assert!(other.verify_token(&token).is_err());
    }

    #[test]
    fn test_user_without_id_rejected() {
        let jwt = JwtValidator::new("test-secret", 3600);
        let mut user = test_user(false);
        user.id = None;
        assert!(jwt.generate_token(&user).is_err());
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header("Bearer abc"), Some("abc"));
        assert_eq!(extract_token_from_header("bearer abc"), Some("abc"));
        assert_eq!(extract_token_from_header("Basic abc"), None);
        assert_eq!(extract_token_from_header("Bearer "), None);
    }
}
