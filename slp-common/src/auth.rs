//! Password hashing and session tokens
//!
//! # Password storage
//!
//! - Per-user random salt (32 bytes, stored as 64 hex characters)
//! - Hash = SHA-256 iterated [`HASH_ROUNDS`] times over `salt || password`,
//!   each round feeding the previous digest back in
//! - Stored as 64 hex characters next to the salt
//!
//! # Pure Functions
//!
//! This module contains ONLY pure functions. Database access and HTTP
//! handling live in the server crate.

use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Number of SHA-256 rounds applied to a password
pub const HASH_ROUNDS: u32 = 10_000;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Shortest accepted username (characters)
pub const USERNAME_MIN_LEN: usize = 3;

/// Longest accepted username (characters)
pub const USERNAME_MAX_LEN: usize = 64;

/// Accepted username length range (characters)
pub const USERNAME_LEN: std::ops::RangeInclusive<usize> = USERNAME_MIN_LEN..=USERNAME_MAX_LEN;

/// Credential validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("Username must be {}-{} characters", USERNAME_MIN_LEN, USERNAME_MAX_LEN)]
    UsernameLength,

    #[error("Username may only contain letters, digits, '.', '_' and '-'")]
    UsernameCharacters,

    #[error("Password must be at least {} characters", MIN_PASSWORD_LEN)]
    PasswordTooShort,
}

/// Validate sign-up credentials
pub fn validate_credentials(username: &str, password: &str) -> Result<(), CredentialError> {
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(CredentialError::UsernameLength);
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(CredentialError::UsernameCharacters);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredentialError::PasswordTooShort);
    }
    Ok(())
}

/// Generate a random salt as 64 hex characters
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

/// Hash a password with the given salt
///
/// # Examples
///
/// ```
/// use slp_common::auth::hash_password;
///
/// let hash = hash_password("secret1", "abcd");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, hash_password("secret1", "abcd"));
/// assert_ne!(hash, hash_password("secret1", "abce"));
/// ```
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();

    for _ in 1..HASH_ROUNDS {
        digest = Sha256::new()
            .chain_update(digest)
            .chain_update(salt.as_bytes())
            .finalize();
    }

    format!("{:x}", digest)
}

/// Check a password against a stored hash and salt
///
/// Comparison time does not depend on where the hashes first differ.
pub fn verify_password(password: &str, salt: &str, stored_hash: &str) -> bool {
    let calculated = hash_password(password, salt);
    if calculated.len() != stored_hash.len() {
        return false;
    }
    calculated
        .bytes()
        .zip(stored_hash.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// New opaque session token
pub fn new_session_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
