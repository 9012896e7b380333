//! Admin passcode hashing using Argon2id.
//!
//! The admin passcode is stored as a PHC-formatted Argon2id hash so the
//! plaintext never has to be persisted next to club data.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Error type for passcode operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash passcode: {0}")]
    HashError(String),

    #[error("Failed to verify passcode: {0}")]
    VerifyError(String),

    #[error("Invalid passcode hash format")]
    InvalidHashFormat,

    #[error("Passcode must be between {MIN_PASSCODE_LENGTH} and {MAX_PASSCODE_LENGTH} characters")]
    InvalidLength,
}

/// Argon2id parameters following OWASP recommendations (2024).
const MEMORY_COST: u32 = 19456; // 19 MiB in KiB
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;
const OUTPUT_LEN: usize = 32;

/// Minimum accepted passcode length, after trimming.
pub const MIN_PASSCODE_LENGTH: usize = 6;
/// Maximum accepted passcode length, after trimming.
pub const MAX_PASSCODE_LENGTH: usize = 128;

fn create_argon2() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST, TIME_COST, PARALLELISM, Some(OUTPUT_LEN))
        .map_err(|e| PasswordError::HashError(format!("Failed to create Argon2 params: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Checks that a new passcode (trimmed) has an acceptable length.
pub fn validate_passcode(passcode: &str) -> Result<(), PasswordError> {
    let len = passcode.trim().chars().count();
    if (MIN_PASSCODE_LENGTH..=MAX_PASSCODE_LENGTH).contains(&len) {
        Ok(())
    } else {
        Err(PasswordError::InvalidLength)
    }
}

/// Hashes a passcode (trimmed) using Argon2id.
///
/// # Example
/// ```
/// use shared::password::hash_passcode;
///
/// let hash = hash_passcode("club-admin-2024").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_passcode(passcode: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = create_argon2()?;

    argon2
        .hash_password(passcode.trim().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a submitted passcode (trimmed) against a stored hash.
///
/// Returns `Ok(false)` on mismatch and `Err` only when the stored hash is unusable.
pub fn verify_passcode(passcode: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    // Parameters come from the PHC string itself.
    let argon2 = Argon2::default();

    match argon2.verify_password(passcode.trim().as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}
