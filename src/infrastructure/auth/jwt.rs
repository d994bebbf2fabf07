//! JWT access and refresh token generation and validation

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::user::{User, UserId};
use crate::domain::DomainError;

/// Kind of token, so refresh tokens cannot be used as access tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub is_admin: bool,
    pub typ: TokenType,
    /// Random token ID; makes every refresh token unique
    pub jti: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

impl JwtClaims {
    /// Create new claims for a user
    pub fn new(user: &User, typ: TokenType, lifetime: Duration) -> Self {
        let now = Utc::now();

        let mut jti = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut jti);

        Self {
            sub: user.id().to_string(),
            email: user.email().to_string(),
            is_admin: user.is_admin(),
            typ,
            jti: hex::encode(jti),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Get user ID from claims
    pub fn user_id(&self) -> Result<UserId, DomainError> {
        UserId::parse(&self.sub).map_err(|_| DomainError::unauthenticated("Invalid token subject"))
    }
}

/// Configuration for JWT service
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_hours: i64,
}

impl JwtConfig {
    /// Create new JWT configuration
    pub fn new(
        secret: impl Into<String>,
        access_token_minutes: i64,
        refresh_token_hours: i64,
    ) -> Self {
        Self {
            secret: secret.into(),
            access_token_minutes,
            refresh_token_hours,
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            access_token_minutes: 60,
            refresh_token_hours: 168,
        }
    }
}

impl From<&crate::config::AuthConfig> for JwtConfig {
    fn from(config: &crate::config::AuthConfig) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            config.access_token_minutes,
            config.refresh_token_hours,
        )
    }
}

/// Trait for JWT operations
pub trait JwtGenerator: Send + Sync + Debug {
    /// Generate a token of the given type for a user
    fn generate(&self, user: &User, typ: TokenType) -> Result<String, DomainError>;

    /// Validate a token and check it is of the expected type
    fn validate(&self, token: &str, expected: TokenType) -> Result<JwtClaims, DomainError>;

    /// Access token lifetime in seconds, reported to clients
    fn access_expires_in(&self) -> i64;
}

/// HS256 JWT service
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_minutes", &self.config.access_token_minutes)
            .field("refresh_token_hours", &self.config.refresh_token_hours)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Create a new JWT service with the given configuration
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    fn lifetime(&self, typ: TokenType) -> Duration {
        match typ {
            TokenType::Access => Duration::minutes(self.config.access_token_minutes),
            TokenType::Refresh => Duration::hours(self.config.refresh_token_hours),
        }
    }
}

impl JwtGenerator for JwtService {
    fn generate(&self, user: &User, typ: TokenType) -> Result<String, DomainError> {
        let claims = JwtClaims::new(user, typ, self.lifetime(typ));

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to generate JWT: {}", e)))
    }

    fn validate(&self, token: &str, expected: TokenType) -> Result<JwtClaims, DomainError> {
        let validation = Validation::default();

        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| DomainError::unauthenticated(format!("Invalid token: {}", e)))?;

        if token_data.claims.typ != expected {
            return Err(DomainError::unauthenticated("Wrong token type"));
        }

        Ok(token_data.claims)
    }

    fn access_expires_in(&self) -> i64 {
        self.config.access_token_minutes * 60
    }
}
