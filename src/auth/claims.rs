/// Bearer token claims
///
/// The payload is a flat string-to-string map chosen by the issuer, plus the
/// standard `exp`/`iat` timestamps. Recognized keys are `user_id` for session
/// tokens and `token_id` + `username` for reset tokens, but the token service
/// itself treats the map as opaque.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer-defined claim map
    #[serde(flatten)]
    pub data: HashMap<String, String>,
}

impl Claims {
    /// Create claims expiring `ttl_seconds` from now.
    ///
    /// A non-positive ttl produces a token that is already expired; issuing
    /// stays permissive and verification rejects it.
    pub fn new(data: HashMap<String, String>, ttl_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            exp: now + ttl_seconds,
            iat: now,
            data,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let mut data = HashMap::new();
        data.insert("user_id".to_string(), "abc".to_string());
        let claims = Claims::new(data, 3600);

        assert_eq!(claims.get("user_id"), Some("abc"));
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn test_expiration_strictly_after_issuance() {
        let claims = Claims::new(HashMap::new(), 1);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_missing_claim() {
        let claims = Claims::new(HashMap::new(), 3600);
        assert_eq!(claims.get("user_id"), None);
    }
}
