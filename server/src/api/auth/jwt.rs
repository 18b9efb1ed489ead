//! Signed session token handling
//!
//! Both token kinds carry the same claim set `{email, user id}`; they differ
//! in signing secret and lifetime. Access tokens are stateless; refresh
//! tokens are additionally persisted server-side for revocability.

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token validation error
#[derive(Debug)]
pub enum JwtError {
    /// Token has expired
    Expired,
    /// Token signature is invalid
    InvalidSignature,
    /// Other validation error
    Invalid(String),
}

impl fmt::Display for JwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => write!(f, "Token has expired"),
            Self::InvalidSignature => write!(f, "Invalid token signature"),
            Self::Invalid(msg) => write!(f, "Invalid token: {}", msg),
        }
    }
}

impl std::error::Error for JwtError {}

/// Claims embedded in access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User email
    pub sub: String,
    /// Durable user id
    pub uid: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl TokenClaims {
    pub fn new(email: &str, user_id: &str, ttl_secs: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::seconds(ttl_secs);

        Self {
            sub: email.to_string(),
            uid: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Get the email from claims
    pub fn email(&self) -> &str {
        &self.sub
    }

    /// Get the user id from claims
    pub fn user_id(&self) -> &str {
        &self.uid
    }
}

/// Create a signed token for the given claims
pub fn create_token(
    secret: &[u8],
    email: &str,
    user_id: &str,
    ttl_secs: i64,
) -> Result<String, JwtError> {
    let claims = TokenClaims::new(email, user_id, ttl_secs);
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| JwtError::Invalid(e.to_string()))
}

/// Validate and decode a signed token
pub fn validate_token(token: &str, secret: &[u8]) -> Result<TokenClaims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<TokenClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::Invalid(e.to_string()),
        })?;

    Ok(token_data.claims)
}
