/// Reset credentials
///
/// A persisted, single-use, time-bounded record authorizing one password
/// change. The lifecycle is Created (used=false, unexpired) to Consumed
/// (used=true, terminal); "expired" is a read-time classification, not a
/// persisted state. The `used` flag is monotonic: false to true, never back.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Fixed validity window for a reset credential
pub const RESET_VALIDITY_DAYS: i64 = 31;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetCredential {
    pub id: Uuid,
    /// Informational random string; the bearer token is what authorizes
    pub token: String,
    pub expiration_date: DateTime<Utc>,
    pub used: bool,
    /// Target account, by email
    pub username: String,
}

impl ResetCredential {
    /// Create an unused credential valid for the fixed window from now.
    pub fn new(username: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            token: random_token(),
            expiration_date: Utc::now() + Duration::days(RESET_VALIDITY_DAYS),
            used: false,
            username,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expiration_date
    }

    /// Both checks are required independently: a consumed credential is
    /// invalid even if unexpired, and vice versa.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.used {
            return Err(AppError::AlreadyConsumed);
        }
        if self.is_expired() {
            return Err(AppError::Expired);
        }
        Ok(())
    }

    /// Seconds of validity remaining, floored at zero.
    pub fn remaining_ttl_seconds(&self) -> i64 {
        (self.expiration_date - Utc::now()).num_seconds().max(0)
    }
}

fn random_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_credential_is_valid() {
        let credential = ResetCredential::new("user@example.com".to_string());

        assert!(!credential.used);
        assert!(credential.validate().is_ok());
        assert!(credential.remaining_ttl_seconds() > 0);
    }

    #[test]
    fn test_used_credential_fails_already_consumed() {
        let mut credential = ResetCredential::new("user@example.com".to_string());
        credential.used = true;

        match credential.validate() {
            Err(AppError::AlreadyConsumed) => (),
            other => panic!("expected AlreadyConsumed, got {:?}", other),
        }
    }

    #[test]
    fn test_credential_one_second_past_window_is_expired() {
        // created 31 days + 1 second ago, so the window closed one second ago
        let mut credential = ResetCredential::new("user@example.com".to_string());
        credential.expiration_date = Utc::now() - Duration::seconds(1);

        match credential.validate() {
            Err(AppError::Expired) => (),
            other => panic!("expected Expired, got {:?}", other),
        }
    }

    #[test]
    fn test_credential_one_second_inside_window_is_valid() {
        let mut credential = ResetCredential::new("user@example.com".to_string());
        credential.expiration_date = Utc::now() + Duration::seconds(1);

        assert!(credential.validate().is_ok());
    }

    #[test]
    fn test_used_wins_over_expired_classification() {
        let mut credential = ResetCredential::new("user@example.com".to_string());
        credential.used = true;
        credential.expiration_date = Utc::now() - Duration::seconds(10);

        match credential.validate() {
            Err(AppError::AlreadyConsumed) => (),
            other => panic!("expected AlreadyConsumed, got {:?}", other),
        }
    }

    #[test]
    fn test_informational_token_is_random() {
        let a = ResetCredential::new("user@example.com".to_string());
        let b = ResetCredential::new("user@example.com".to_string());

        assert_eq!(a.token.len(), 32);
        assert_ne!(a.token, b.token);
    }
}
