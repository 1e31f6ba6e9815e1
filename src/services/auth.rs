//! Signup/login service

use tracing::info;

use crate::auth::{hash_password, verify_password};
use crate::db::schemas::UserDoc;
use crate::services::user::UserService;
use crate::types::{Result, ToyshopError};

/// Authentication service; credential checks live here, token issuance at
/// the HTTP surface.
#[derive(Clone)]
pub struct AuthService {
    users: UserService,
}

impl AuthService {
    pub fn new(users: UserService) -> Self {
        Self { users }
    }

    /// Create an account and return the stored user.
    pub async fn signup(&self, username: &str, password: &str, fullname: &str) -> Result<UserDoc> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ToyshopError::Http("username and password are required".into()));
        }

        let hash = hash_password(password)?;
        let user = self
            .users
            .add(UserDoc::new(
                username.trim().to_string(),
                hash,
                fullname.trim().to_string(),
            ))
            .await?;

        info!("New account created: {}", user.username);
        Ok(user)
    }

    /// Verify credentials and return the user. Unknown usernames and wrong
    /// passwords are indistinguishable to the caller.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserDoc> {
        let user = self
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| ToyshopError::Auth("invalid username or password".into()))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(ToyshopError::Auth("invalid username or password".into()));
        }

        Ok(user)
    }
}
