//! Password gate
//!
//! The service is protected by a single shared password. The configured
//! value is the hex SHA-256 digest of the password, never the password
//! itself. Submitted passwords are hashed and compared against it.
//!
//! # Pure Functions
//!
//! No HTTP framework dependencies here; the service owns cookies and routes.

use sha2::{Digest, Sha256};

/// Name of the cookie carrying the session token after a successful login
pub const SESSION_COOKIE: &str = "comprank_session";

/// Password gate errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    /// Submitted password does not hash to the configured digest
    #[error("Password incorrect")]
    Incorrect,

    /// Configured digest is not 64 hex characters
    #[error("Configured password digest is malformed")]
    MalformedDigest,
}

/// Hex SHA-256 digest of `password`
///
/// # Examples
///
/// ```
/// use comprank_common::api::auth::hash_password;
///
/// let digest = hash_password("secret");
/// assert_eq!(digest.len(), 64);
/// ```
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check `candidate` against the configured hex digest
///
/// The digest comparison ignores ASCII case so digests pasted in upper case
/// still work.
pub fn verify_password(candidate: &str, expected_sha256: &str) -> Result<(), PasswordError> {
    let expected = expected_sha256.trim();
    if expected.len() != 64 || !expected.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PasswordError::MalformedDigest);
    }

    if hash_password(candidate).eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(PasswordError::Incorrect)
    }
}
