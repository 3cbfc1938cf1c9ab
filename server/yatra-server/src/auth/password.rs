//! Argon2id password hashing
//!
//! Hashing is CPU-bound, so both operations run on the blocking pool.

use crate::error::ApiError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

fn hasher() -> Result<Argon2<'static>, ApiError> {
    // 19 MiB, 2 iterations, 1 lane
    let params = Params::new(19_456, 2, 1, Some(32))
        .map_err(|e| ApiError::internal(format!("Failed to build Argon2 params: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Check password length before hashing
///
/// # Errors
/// `Validation` when the password is too short.
pub fn validate_password_strength(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

/// Hash a password into a PHC string
///
/// # Errors
/// `Validation` for weak passwords, `Internal` when hashing fails.
pub async fn hash_password(password: &str) -> Result<String, ApiError> {
    validate_password_strength(password)?;
    let password = password.to_string();

    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        hasher()?
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))
    })
    .await
    .map_err(|e| ApiError::internal(format!("Password hashing task failed: {e}")))?
}

/// Verify a password against a stored PHC hash
///
/// # Errors
/// `Internal` when the stored hash cannot be parsed.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let password = password.to_string();
    let hash = hash.to_string();

    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash)
            .map_err(|e| ApiError::internal(format!("Failed to parse password hash: {e}")))?;
        match hasher()?.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(ApiError::internal(format!("Password verification error: {e}"))),
        }
    })
    .await
    .map_err(|e| ApiError::internal(format!("Password verification task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("s3cret-pass").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cret-pass", &hash).await.unwrap());
        assert!(!verify_password("wrong-pass", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn short_passwords_are_rejected() {
        let err = hash_password("short").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        assert!(verify_password("whatever1", "not-a-hash").await.is_err());
    }
}
