use crate::domain::record::User;
use crate::error::FxError;
use crate::storage::{NewUser, UserStore};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Lowercase hex SHA-256, the format stored in `users.password_hash`.
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserStore>,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Unknown, inactive and wrong-password users all fail the same way.
    pub async fn authenticate(&self, username: &str, password: &str) -> anyhow::Result<User> {
        let failed = || FxError::AuthenticationFailed {
            username: username.to_string(),
        };

        let Some(user) = self.users.find_by_username(username).await? else {
            tracing::warn!(%username, "login rejected: unknown user");
            return Err(failed().into());
        };
        if !user.is_active {
            tracing::warn!(%username, "login rejected: inactive user");
            return Err(failed().into());
        }
        if user.password_hash != hash_password(password) {
            tracing::warn!(%username, "login rejected: password mismatch");
            return Err(failed().into());
        }

        tracing::info!(%username, user_id = %user.id, "login ok");
        Ok(user)
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<String>,
    ) -> anyhow::Result<User> {
        anyhow::ensure!(!username.trim().is_empty(), "username must not be empty");
        anyhow::ensure!(!password.is_empty(), "password must not be empty");
        self.users
            .create(NewUser {
                username: username.trim().to_string(),
                password_hash: hash_password(password),
                email,
            })
            .await
    }

    pub async fn change_password(&self, username: &str, password: &str) -> anyhow::Result<bool> {
        anyhow::ensure!(!password.is_empty(), "password must not be empty");
        self.users
            .set_password(username, &hash_password(password))
            .await
    }
}
