use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

use crate::error::{AppError, AppResult};

/// Argon2id PHC string for a new account password.
pub fn hash_password(plain: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hash failed");
            AppError::Store(anyhow::anyhow!("password hashing failed: {e}"))
        })
}

/// Accepts only when the account has a stored hash and `candidate` matches it.
/// Google-only accounts (no hash) and unreadable hashes both read as bad credentials.
pub fn check_credentials(candidate: &str, stored: Option<&str>) -> AppResult<()> {
    let Some(stored) = stored else {
        warn!("password login on account without a password");
        return Err(AppError::InvalidCredentials);
    };
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash unreadable");
        AppError::InvalidCredentials
    })?;
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .map_err(|_| AppError::InvalidCredentials)
}
