use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand_core::OsRng;

use crate::error::ServiceError;
use crate::validation::validate_password;

/// Validate strength, then hash with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    validate_password(password)?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| ServiceError::Internal(format!("password hashing failed: {err}")))?;
    Ok(hash.to_string())
}

/// `false` for a wrong password or an unreadable stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "stored password hash is malformed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_and_are_salted() {
        let first = hash_password("tr1cky-pass").expect("hashes");
        let second = hash_password("tr1cky-pass").expect("hashes");
        assert_ne!(first, second);
        assert!(verify_password("tr1cky-pass", &first));
        assert!(!verify_password("tr1cky-past", &first));
    }

    #[test]
    fn weak_passwords_are_rejected_before_hashing() {
        assert!(matches!(
            hash_password("password"),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything1", "not-a-phc-string"));
    }
}
