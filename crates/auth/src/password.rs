//! Salted one-way password digests (Argon2id, PHC string format).

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("failed to gather salt entropy: {0}")]
    Entropy(String),

    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// Hash `password` with a fresh random salt.
///
/// Two calls on the same input produce different digests.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| PasswordHashError::Entropy(e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordHashError::Hash(e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordHashError::Hash(e.to_string()))?
        .to_string();
    Ok(phc)
}

/// Check `password` against a stored digest.
///
/// The digest comparison is constant-time. A digest that does not parse
/// verifies as `false`.
pub fn verify_password(password: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password digest is malformed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_own_digest_only() {
        let digest = hash_password("newTestUser1").unwrap();
        assert!(verify_password("newTestUser1", &digest));
        assert!(!verify_password("newTestUser2", &digest));
    }

    #[test]
    fn salts_are_fresh() {
        let a = hash_password("samePassword1").unwrap();
        let b = hash_password("samePassword1").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("samePassword1", &a));
        assert!(verify_password("samePassword1", &b));
    }

    #[test]
    fn malformed_digest_fails_closed() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
