//! Stateless signed session tokens (JWT, HS256).
//!
//! Tokens are a pure function of claims + secret + clock; nothing is
//! persisted and verification never touches the database.

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token is not yet valid")]
    NotYetValid,

    #[error("Malformed or improperly signed token")]
    Malformed,

    #[error("Failed to encode token: {0}")]
    Encode(String),
}

/// Claims embedded in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID, stringified.
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    /// The subject parsed back into a user ID.
    pub fn user_id(&self) -> Result<i32, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Malformed)
    }
}

/// Encodes and verifies signed, time-bound claims.
///
/// Keys are derived once from the process-wide secret; the codec is
/// immutable after construction.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl_minutes: i64,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &[u8], default_ttl_minutes: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            default_ttl_minutes,
        }
    }

    /// Issue a token for a user with the configured default TTL.
    pub fn issue(&self, user_id: i32, username: &str) -> Result<String, TokenError> {
        self.issue_with_ttl(user_id, username, self.default_ttl_minutes)
    }

    /// Issue a token with an explicit TTL. `iat` and `nbf` are both "now";
    /// two tokens issued in the same second carry identical claims and that
    /// is fine, verification never assumes uniqueness.
    pub fn issue_with_ttl(
        &self,
        user_id: i32,
        username: &str,
        ttl_minutes: i64,
    ) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now,
            nbf: now,
            exp: now + ttl_minutes * 60,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Check the signature, then the temporal claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::ImmatureSignature => TokenError::NotYetValid,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"test-secret-key", 15)
    }

    #[test]
    fn issue_then_verify_round_trips_claims() {
        let codec = codec();
        let token = codec.issue(42, "alice").unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.username, "alice");
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.iat, claims.nbf);
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let token = codec.issue_with_ttl(1, "alice", -1).unwrap();

        assert!(matches!(codec.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn token_from_the_future_is_rejected() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "1".to_string(),
            username: "alice".to_string(),
            iat: now + 600,
            nbf: now + 600,
            exp: now + 1200,
        };
        let token = encode(&Header::default(), &claims, &codec.encoding_key).unwrap();

        assert!(matches!(codec.verify(&token), Err(TokenError::NotYetValid)));
    }

    #[test]
    fn tampered_token_is_malformed() {
        let codec = codec();
        let token = codec.issue(1, "alice").unwrap();
        let tampered = format!("{}xxxxx", &token[..token.len() - 5]);

        assert!(matches!(codec.verify(&tampered), Err(TokenError::Malformed)));
    }

    #[test]
    fn garbage_tokens_are_malformed() {
        let codec = codec();

        for garbage in ["", "not-a-token", "a.b.c", "ey.ey.ey"] {
            assert!(
                matches!(codec.verify(garbage), Err(TokenError::Malformed)),
                "{garbage:?} should be malformed"
            );
        }
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let token = codec().issue(1, "alice").unwrap();
        let other = TokenCodec::new(b"different-secret", 15);

        assert!(matches!(other.verify(&token), Err(TokenError::Malformed)));
    }
}
