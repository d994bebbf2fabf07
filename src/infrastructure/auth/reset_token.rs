//! Signed password reset tokens
//!
//! A token is the URL-safe base64 of `{email, exp, signature}` where the
//! signature is a hex HMAC-SHA256 over the email, the expiry and the user's
//! current password hash. Changing the password therefore invalidates every
//! outstanding token without any server-side state.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::domain::user::User;
use crate::domain::DomainError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct ResetPayload {
    email: String,
    exp: i64,
    signature: String,
}

/// Mints and checks password reset tokens
#[derive(Clone)]
pub struct ResetTokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for ResetTokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetTokenSigner")
            .field("secret", &"[hidden]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl ResetTokenSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl_minutes: i64) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    fn mac(&self, email: &str, exp: i64, password_hash: &str) -> Result<HmacSha256, DomainError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| DomainError::internal(format!("Invalid reset token key: {}", e)))?;
        mac.update(email.as_bytes());
        mac.update(b"\n");
        mac.update(exp.to_string().as_bytes());
        mac.update(b"\n");
        mac.update(password_hash.as_bytes());
        Ok(mac)
    }

    /// Issue a token for the user's current password hash
    pub fn issue(&self, user: &User) -> Result<String, DomainError> {
        let exp = (Utc::now() + self.ttl).timestamp();
        let payload = ResetPayload {
            email: user.email().to_string(),
            exp,
            signature: hex::encode(
                self.mac(user.email(), exp, user.password_hash())?
                    .finalize()
                    .into_bytes(),
            ),
        };

        let json = serde_json::to_vec(&payload)
            .map_err(|e| DomainError::internal(format!("Failed to encode reset token: {}", e)))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Extract the email a token claims to be for, without trusting it
    pub fn claimed_email(&self, token: &str) -> Option<String> {
        decode_payload(token).map(|payload| payload.email)
    }

    /// Check a token against the user it names
    pub fn verify(&self, token: &str, user: &User) -> bool {
        let Some(payload) = decode_payload(token) else {
            return false;
        };

        if payload.email != user.email() || payload.exp <= Utc::now().timestamp() {
            return false;
        }

        let Ok(expected) = hex::decode(&payload.signature) else {
            return false;
        };

        let Ok(mac) = self.mac(&payload.email, payload.exp, user.password_hash()) else {
            return false;
        };

        // Constant-time comparison
        mac.verify_slice(&expected).is_ok()
    }
}

fn decode_payload(token: &str) -> Option<ResetPayload> {
    let bytes = URL_SAFE_NO_PAD.decode(token.trim()).ok()?;
    serde_json::from_slice(&bytes).ok()
}
