/// Password Hashing and Verification
///
/// bcrypt with the default cost. The hash output embeds its own salt and
/// cost, so verification needs nothing out-of-band. Both functions are pure
/// and safe to call concurrently.

use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};

use crate::error::AppError;
use crate::validators::ValidationError;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Hash a password using bcrypt.
///
/// Fails on length-limit violations or on internal hashing failure; the
/// latter is fatal and not retried.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooShort(
            "password",
            MIN_PASSWORD_LENGTH,
        )));
    }
    // bcrypt truncates past 72 bytes; cap well below to keep behavior obvious
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password",
            MAX_PASSWORD_LENGTH,
        )));
    }

    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

/// Verify a password against a stored hash.
///
/// Returns `Ok(false)` on any mismatch, including a malformed stored hash;
/// only internal computation failure surfaces as an error.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    match verify(password, stored_hash) {
        Ok(matches) => Ok(matches),
        Err(
            BcryptError::InvalidHash(_)
            | BcryptError::InvalidPrefix(_)
            | BcryptError::InvalidCost(_)
            | BcryptError::InvalidSaltLen(_)
            | BcryptError::InvalidBase64(_),
        ) => Ok(false),
        Err(e) => Err(AppError::Internal(format!(
            "password verification failed: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_self_describing() {
        let hashed = hash_password("correct horse battery").expect("failed to hash");

        assert_ne!(hashed, "correct horse battery");
        assert!(hashed.starts_with("$2"));
    }

    #[test]
    fn test_verify_round_trip() {
        let hashed = hash_password("correct horse battery").expect("failed to hash");

        assert!(verify_password("correct horse battery", &hashed).unwrap());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hashed = hash_password("correct horse battery").expect("failed to hash");

        assert!(!verify_password("wrong horse battery", &hashed).unwrap());
    }

    #[test]
    fn test_verify_malformed_hash_is_false_not_error() {
        assert!(!verify_password("whatever12", "not-a-bcrypt-hash").unwrap());
        assert!(!verify_password("whatever12", "").unwrap());
    }

    #[test]
    fn test_too_short_password_rejected() {
        assert!(hash_password("short").is_err());
    }

    #[test]
    fn test_too_long_password_rejected() {
        let long = "a".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(hash_password(&long).is_err());
    }
}
