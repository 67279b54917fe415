//! # tb-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! Resolves HTTP Basic credentials against the `users` table so every write
//! is attributed to the caller who made it.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use base64::Engine;
use tb_core::error::{AppError, Result};
use tb_core::models::User;
use tb_core::traits::{AuthProvider, UserRepo};

/// Hashes a password into an Argon2id PHC string suitable for `users.password_hash`.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Verifies if a provided password matches a stored Argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Splits `Basic <base64(user:pass)>` into its two halves.
fn parse_basic(authorization: &str) -> Option<(String, String)> {
    let (scheme, encoded) = authorization.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_owned(), pass.to_owned()))
}

pub struct SimpleAuthProvider {
    users: Arc<dyn UserRepo>,
    realm: String,
}

impl SimpleAuthProvider {
    pub fn new(users: Arc<dyn UserRepo>, realm: impl Into<String>) -> Self {
        Self {
            users,
            realm: realm.into(),
        }
    }
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    async fn authenticate(&self, authorization: &str) -> Result<User> {
        let (username, password) = parse_basic(authorization)
            .ok_or_else(|| AppError::Unauthorized("malformed Basic credentials".into()))?;

        let Some(user) = self.users.find_by_username(&username).await? else {
            tracing::debug!(%username, "unknown user");
            return Err(AppError::Unauthorized("invalid credentials".into()));
        };

        // Argon2 verification is CPU-bound.
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("password check aborted: {e}")))?;

        if !matches {
            tracing::debug!(%username, "password mismatch");
            return Err(AppError::Unauthorized("invalid credentials".into()));
        }
        Ok(user)
    }

    fn realm(&self) -> String {
        self.realm.clone()
    }
}
