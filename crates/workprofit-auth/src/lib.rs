//! Credentials and access tokens for WorkProfit users

pub mod jwt;
pub mod password;

pub use jwt::{JwtClaims, JwtError, JwtValidator, DEFAULT_TOKEN_TTL_MINUTES};
pub use password::{hash_password, verify_password, PasswordError};
