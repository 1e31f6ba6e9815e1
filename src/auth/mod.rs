//! Authentication and authorization
//!
//! Provides:
//! - JWT token generation and validation
//! - Password hashing with Argon2
//! - The authenticated caller identity handed to services

pub mod jwt;
pub mod password;

pub use jwt::{extract_token_from_header, Claims, JwtValidator};
pub use password::{hash_password, verify_password};

/// Already-authenticated caller identity, resolved by the HTTP surface and
/// injected into service calls that need authorization decisions.
#[derive(Debug, Clone)]
pub struct LoggedInUser {
    /// User id (hex)
    pub id: String,
    pub username: String,
    pub fullname: String,
    pub is_admin: bool,
}

impl From<Claims> for LoggedInUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            fullname: claims.fullname,
            is_admin: claims.is_admin,
        }
    }
}
