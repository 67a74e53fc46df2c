use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::errors::AppError;

/// Hashes `password` with Argon2id and a random salt, returning a PHC string.
/// Runs on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(anyhow!("Failed to hash password: {e}")))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow!("Password hashing task failed: {e}")))?
}

/// Checks `password` against a stored PHC hash. A corrupt hash counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || match PasswordHash::new(&hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is unreadable: {e}");
            false
        }
    })
    .await
    .map_err(|e| AppError::Internal(anyhow!("Password verification task failed: {e}")))
}
