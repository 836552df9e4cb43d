/// Token Service
///
/// Issues and verifies signed, expiring bearer tokens (HS256). Tokens are
/// self-contained: no record of issued tokens is kept and there is no
/// revocation. The signing secret is injected once at construction and held
/// for the process lifetime; rotating it invalidates everything outstanding.

use std::collections::HashMap;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::error::AppError;

/// Why a token failed verification
#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    /// Signature does not match the process secret
    InvalidSignature,
    /// Embedded expiration is in the past
    Expired,
    /// Structure cannot be parsed as a token
    Malformed,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::InvalidSignature => write!(f, "token signature mismatch"),
            TokenError::Expired => write!(f, "token expired"),
            TokenError::Malformed => write!(f, "token malformed"),
        }
    }
}

impl std::error::Error for TokenError {}

// Callers outside the auth core only need to know the token was unusable.
impl From<TokenError> for AppError {
    fn from(_: TokenError) -> Self {
        AppError::Unauthorized
    }
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Serialize `data` plus an expiration of now + ttl and sign it.
    pub fn issue(
        &self,
        data: HashMap<String, String>,
        ttl_seconds: i64,
    ) -> Result<String, AppError> {
        let claims = Claims::new(data, ttl_seconds);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("token signing failed: {}", e)))
    }

    /// Verify signature and expiry, returning the original claim map.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is strict: a token one second past its window is dead.
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token verification failed");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        TokenError::InvalidSignature
                    }
                    _ => TokenError::Malformed,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret-key-at-least-32-characters-long")
    }

    fn sample_data() -> HashMap<String, String> {
        let mut data = HashMap::new();
        data.insert("user_id".to_string(), "1f2e3d4c".to_string());
        data.insert("username".to_string(), "user@example.com".to_string());
        data
    }

    #[test]
    fn test_issue_and_verify_round_trips_claims() {
        let service = service();
        let token = service
            .issue(sample_data(), 3600)
            .expect("failed to issue token");

        let claims = service.verify(&token).expect("failed to verify token");
        assert_eq!(claims.data, sample_data());
    }

    #[test]
    fn test_negative_ttl_fails_expired() {
        let service = service();
        let token = service
            .issue(sample_data(), -1)
            .expect("failed to issue token");

        assert_eq!(service.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_token_fails_signature() {
        let service = service();
        let token = service
            .issue(sample_data(), 3600)
            .expect("failed to issue token");

        // Flip the final signature byte
        let mut bytes = token.into_bytes();
        let last = bytes.len() - 1;
        bytes[last] = if bytes[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert_eq!(
            service.verify(&tampered),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_wrong_secret_fails_signature() {
        let token = service()
            .issue(sample_data(), 3600)
            .expect("failed to issue token");

        let other = TokenService::new("a-completely-different-signing-secret");
        assert_eq!(other.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_fails_malformed() {
        assert_eq!(
            service().verify("not.a.token"),
            Err(TokenError::Malformed)
        );
        assert_eq!(service().verify(""), Err(TokenError::Malformed));
    }
}
