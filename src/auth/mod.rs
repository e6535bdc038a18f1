use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod password;
pub mod policy;

pub use policy::authorize;

/// The authenticated caller, as carried inside a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
}

impl Identity {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user: Identity,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT generation error: {0}")]
    Generation(String),

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Issues and verifies signed, time-bounded identity tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: u64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }
        let ttl_secs = i64::try_from(ttl_secs).map_err(|_| TokenError::Generation("ttl out of range".to_string()))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        })
    }

    pub fn issue(&self, identity: Identity) -> Result<String, TokenError> {
        self.issue_at(identity, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now` (unix seconds).
    pub fn issue_at(&self, identity: Identity, now: i64) -> Result<String, TokenError> {
        let claims = Claims {
            user: identity,
            iat: now,
            exp: now + self.ttl.num_seconds(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token against the clock value `now` (unix seconds).
    /// Tokens are rejected at or after their expiration instant.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the supplied clock, with no leeway
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        if now >= token_data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(token_data.claims.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";
    const TTL: u64 = 360_000;

    fn service() -> TokenService {
        TokenService::new(SECRET, TTL).unwrap()
    }

    #[test]
    fn test_round_trip_returns_identity() {
        let identity = Identity::new(Uuid::new_v4());
        let token = service().issue(identity).unwrap();
        assert_eq!(service().verify(&token).unwrap(), identity);
    }

    #[test]
    fn test_round_trip_with_short_ttl() {
        let tokens = TokenService::new(SECRET, 1).unwrap();
        let identity = Identity::new(Uuid::new_v4());
        let token = tokens.issue_at(identity, 1_000).unwrap();
        assert_eq!(tokens.verify_at(&token, 1_000).unwrap(), identity);
    }

    #[test]
    fn test_expired_at_and_after_exp() {
        let identity = Identity::new(Uuid::new_v4());
        let token = service().issue_at(identity, 1_000).unwrap();
        let exp = 1_000 + TTL as i64;

        assert!(service().verify_at(&token, exp - 1).is_ok());
        assert!(matches!(service().verify_at(&token, exp), Err(TokenError::Expired)));
        assert!(matches!(service().verify_at(&token, exp + 3600), Err(TokenError::Expired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let identity = Identity::new(Uuid::new_v4());
        let token = service().issue(identity).unwrap();
        let other = TokenService::new("another-secret", TTL).unwrap();
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_tampered_bytes_rejected() {
        let identity = Identity::new(Uuid::new_v4());
        let token = service().issue(identity).unwrap();

        for index in [0, token.len() / 2, token.len() - 1] {
            let mut bytes = token.clone().into_bytes();
            bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(service().verify(&tampered).is_err(), "tampered at {index}");
        }
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(service().verify("").is_err());
        assert!(service().verify("not-a-token").is_err());
        assert!(service().verify("a.b.c").is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(TokenService::new("", TTL), Err(TokenError::InvalidSecret)));
    }
}
