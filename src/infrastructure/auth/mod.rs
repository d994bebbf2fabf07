//! Authentication infrastructure module
//!
//! JWT access/refresh tokens, signed password reset tokens and the
//! authentication service built on them.

mod jwt;
mod reset_token;
mod service;

pub use jwt::{JwtClaims, JwtConfig, JwtGenerator, JwtService, TokenType};
pub use reset_token::ResetTokenSigner;
pub use service::{AuthService, RegisterRequest, TokenPair};
