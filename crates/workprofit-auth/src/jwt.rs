//! Access token issuing and validation (HS256)

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ISSUER: &str = "workprofit";

/// Minutes an access token stays valid unless configured otherwise
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JwtClaims {
    /// Subject: the user's email
    pub sub: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl JwtClaims {
    pub fn new(email: impl Into<String>, issuer: impl Into<String>, validity: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: email.into(),
            iat: now.timestamp(),
            exp: (now + validity).timestamp(),
            iss: issuer.into(),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.exp, 0)
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("JWT encoding error: {0}")]
    EncodingError(jsonwebtoken::errors::Error),
}

/// Signs and checks access tokens with one shared secret.
#[derive(Clone)]
pub struct JwtValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
}

impl JwtValidator {
    /// Signature, expiry and issuer are checked; audience is not used.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_issuer(&[DEFAULT_ISSUER]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: DEFAULT_ISSUER.to_string(),
            ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token whose subject is `email`.
    pub fn issue(&self, email: &str) -> Result<String, JwtError> {
        let claims = JwtClaims::new(email, self.issuer.clone(), self.ttl);
        self.encode(&claims)
    }

    pub fn encode(&self, claims: &JwtClaims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(JwtError::EncodingError)
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, JwtError> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::InvalidToken(e.to_string()),
            })
    }
}

impl std::fmt::Debug for JwtValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtValidator")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"test_secret_key_1234567890";

    #[test]
    fn test_issue_and_validate() {
        let validator = JwtValidator::new(TEST_SECRET);
        let token = validator.issue("alice@example.com").unwrap();

        let claims = validator.validate(&token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.iss, DEFAULT_ISSUER);
        assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_TTL_MINUTES * 60);
    }

    #[test]
    fn test_custom_ttl() {
        let validator = JwtValidator::new(TEST_SECRET).with_ttl(Duration::minutes(5));
        let token = validator.issue("bob@example.com").unwrap();
        let claims = validator.validate(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn test_expired_token() {
        let validator = JwtValidator::new(TEST_SECRET);
        let claims = JwtClaims::new("carol@example.com", DEFAULT_ISSUER, Duration::seconds(-60));
        let token = validator.encode(&claims).unwrap();

        assert!(matches!(
            validator.validate(&token),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = JwtValidator::new(b"another-secret").issue("dave@example.com").unwrap();
        let result = JwtValidator::new(TEST_SECRET).validate(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let validator = JwtValidator::new(TEST_SECRET);
        let claims = JwtClaims::new("erin@example.com", "someone-else", Duration::minutes(5));
        let token = validator.encode(&claims).unwrap();
        assert!(validator.validate(&token).is_err());
    }

    #[test]
    fn test_garbage_token() {
        let validator = JwtValidator::new(TEST_SECRET);
        assert!(matches!(
            validator.validate("not.a.jwt"),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_claims_wire_format() {
        let claims = JwtClaims::new("frank@example.com", DEFAULT_ISSUER, Duration::minutes(1));
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["sub"], "frank@example.com");
        assert!(json.get("exp").is_some());
        assert!(claims.expires_at().is_some());
    }
}
