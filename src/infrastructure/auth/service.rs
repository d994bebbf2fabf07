//! Authentication service: registration, sessions and password reset

use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::domain::notification::Notifier;
use crate::domain::user::{
    normalize_email, validate_email, validate_password, validate_profile, User, UserId,
    UserProfile, UserRepository,
};
use crate::domain::DomainError;
use crate::infrastructure::user::PasswordHasher;

use super::jwt::{JwtClaims, JwtGenerator, TokenType};
use super::reset_token::ResetTokenSigner;

const INVALID_CREDENTIALS: &str = "invalid email or password";
const INVALID_REFRESH: &str = "invalid or expired refresh token";
const INVALID_RESET: &str = "invalid or expired password reset token";

/// Request for registering a new account
#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub comment: Option<String>,
    pub image_agreement: bool,
    pub subscribe_formation: bool,
}

/// Access and refresh tokens handed out on login and refresh
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Authentication service
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    jwt: Arc<dyn JwtGenerator>,
    reset_tokens: ResetTokenSigner,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("jwt", &self.jwt)
            .field("reset_tokens", &self.reset_tokens)
            .finish_non_exhaustive()
    }
}

fn hash_refresh_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        jwt: Arc<dyn JwtGenerator>,
        reset_tokens: ResetTokenSigner,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            users,
            hasher,
            jwt,
            reset_tokens,
            notifier,
        }
    }

    /// Register a new participant account
    pub async fn register(&self, request: RegisterRequest) -> Result<User, DomainError> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;

        let profile = UserProfile {
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            github: optional(request.github),
            linkedin: optional(request.linkedin),
            comment: optional(request.comment),
        };
        validate_profile(&profile)?;
        validate_password(&request.password)?;

        if self.users.email_exists(&email).await? {
            return Err(DomainError::conflict(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        let password_hash = self.hasher.hash(&request.password)?;
        let user = User::new(UserId::generate(), email, password_hash, profile)
            .with_consents(request.image_agreement, request.subscribe_formation);

        let user = self.users.create(user).await?;
        info!(user_id = %user.id(), "User registered");
        Ok(user)
    }

    /// Issue a token pair and remember the refresh token's hash
    async fn start_session(&self, user: &User) -> Result<TokenPair, DomainError> {
        let pair = self.token_pair(user)?;

        let mut user = user.clone();
        user.set_refresh_token_hash(Some(hash_refresh_token(&pair.refresh_token)));
        self.users.update(&user).await?;

        Ok(pair)
    }

    fn token_pair(&self, user: &User) -> Result<TokenPair, DomainError> {
        Ok(TokenPair {
            access_token: self.jwt.generate(user, TokenType::Access)?,
            refresh_token: self.jwt.generate(user, TokenType::Refresh)?,
            token_type: "Bearer",
            expires_in: self.jwt.access_expires_in(),
        })
    }

    /// Check credentials and open a session
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, DomainError> {
        let email = normalize_email(email);

        let user = match self.users.get_by_email(&email).await? {
            Some(user) if self.hasher.verify(password, user.password_hash()) => user,
            _ => {
                debug!("Login rejected");
                return Err(DomainError::unauthenticated(INVALID_CREDENTIALS));
            }
        };

        let pair = self.start_session(&user).await?;
        info!(user_id = %user.id(), "User logged in");
        Ok(pair)
    }

    /// Rotate a refresh token; each refresh token works only once
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        let claims = self
            .jwt
            .validate(refresh_token, TokenType::Refresh)
            .map_err(|_| DomainError::unauthenticated(INVALID_REFRESH))?;
        let user_id = claims.user_id()?;

        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| DomainError::unauthenticated(INVALID_REFRESH))?;

        let pair = self.token_pair(&user)?;
        let swapped = self
            .users
            .swap_refresh_token_hash(
                user_id,
                &hash_refresh_token(refresh_token),
                Some(hash_refresh_token(&pair.refresh_token)),
            )
            .await?;

        if !swapped {
            warn!(user_id = %user_id, "Stale refresh token presented");
            return Err(DomainError::unauthenticated(INVALID_REFRESH));
        }

        debug!(user_id = %user_id, "Session refreshed");
        Ok(pair)
    }

    /// Forget the stored refresh token so it can no longer be used
    pub async fn logout(&self, user_id: UserId) -> Result<(), DomainError> {
        let mut user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", user_id)))?;

        user.set_refresh_token_hash(None);
        self.users.update(&user).await?;

        info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Validate a bearer access token
    pub fn authenticate(&self, access_token: &str) -> Result<JwtClaims, DomainError> {
        self.jwt.validate(access_token, TokenType::Access)
    }

    /// Mail a reset link when the address is registered; unknown addresses
    /// succeed silently so accounts cannot be enumerated
    pub async fn request_password_reset(&self, email: &str) -> Result<(), DomainError> {
        let email = normalize_email(email);

        let Some(user) = self.users.get_by_email(&email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = self.reset_tokens.issue(&user)?;
        match self.notifier.send_password_reset(&user, &token).await {
            Ok(()) => info!(user_id = %user.id(), "Password reset mail sent"),
            Err(e) => warn!(user_id = %user.id(), error = %e, "Failed to send password reset mail"),
        }

        Ok(())
    }

    /// Replace the password using a reset token; open sessions are revoked
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), DomainError> {
        let email = self
            .reset_tokens
            .claimed_email(token)
            .ok_or_else(|| DomainError::unauthenticated(INVALID_RESET))?;

        let mut user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or_else(|| DomainError::unauthenticated(INVALID_RESET))?;

        if !self.reset_tokens.verify(token, &user) {
            return Err(DomainError::unauthenticated(INVALID_RESET));
        }

        validate_password(new_password)?;

        user.set_password_hash(self.hasher.hash(new_password)?);
        user.set_refresh_token_hash(None);
        self.users.update(&user).await?;

        info!(user_id = %user.id(), "Password reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::MockNotifier;
    use crate::infrastructure::auth::{JwtConfig, JwtService};
    use crate::infrastructure::storage::InMemoryDatabase;
    use crate::infrastructure::user::{Argon2Hasher, InMemoryUserRepository};
    use std::sync::Mutex;

    fn service_with(notifier: MockNotifier) -> AuthService {
        AuthService::new(
            Arc::new(InMemoryUserRepository::new(InMemoryDatabase::new())),
            Arc::new(Argon2Hasher::new()),
            Arc::new(JwtService::new(JwtConfig::new("test-secret", 60, 24))),
            ResetTokenSigner::new("test-secret", 60),
            Arc::new(notifier),
        )
    }

    fn service() -> AuthService {
        service_with(MockNotifier::new())
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "password123".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            image_agreement: true,
            ..Default::default()
        }
    }

    fn assert_unauthenticated<T: std::fmt::Debug>(result: Result<T, DomainError>, expected: &str) {
        match result {
            Err(DomainError::Unauthenticated { message }) => assert_eq!(message, expected),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_email() {
        let service = service();

        let user = service
            .register(register_request("  Ada@Example.COM "))
            .await
            .unwrap();

        assert_eq!(user.email(), "ada@example.com");
        assert!(user.image_agreement());
        assert!(user.password_hash().starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let service = service();
        service
            .register(register_request("ada@example.com"))
            .await
            .unwrap();

        let result = service.register(register_request("ADA@example.com")).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let service = service();

        let mut bad_name = register_request("ada@example.com");
        bad_name.first_name = "Ada42".to_string();
        assert!(matches!(
            service.register(bad_name).await,
            Err(DomainError::Validation { .. })
        ));

        let mut short_password = register_request("ada@example.com");
        short_password.password = "short".to_string();
        assert!(matches!(
            service.register(short_password).await,
            Err(DomainError::Validation { .. })
        ));

        let bad_email = register_request("not-an-email");
        assert!(matches!(
            service.register(bad_email).await,
            Err(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_login_and_authenticate() {
        let service = service();
        let user = service
            .register(register_request("ada@example.com"))
            .await
            .unwrap();

        let pair = service
            .login("ADA@example.com", "password123")
            .await
            .unwrap();
        assert_eq!(pair.expires_in, 3600);

        let claims = service.authenticate(&pair.access_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id());

        // Refresh tokens are not access tokens
        assert!(service.authenticate(&pair.refresh_token).is_err());
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() {
        let service = service();
        service
            .register(register_request("ada@example.com"))
            .await
            .unwrap();

        assert_unauthenticated(
            service.login("ada@example.com", "wrong-password").await,
            INVALID_CREDENTIALS,
        );
        assert_unauthenticated(
            service.login("nobody@example.com", "password123").await,
            INVALID_CREDENTIALS,
        );
    }

    #[tokio::test]
    async fn test_refresh_rotates_once() {
        let service = service();
        service
            .register(register_request("ada@example.com"))
            .await
            .unwrap();
        let pair = service.login("ada@example.com", "password123").await.unwrap();

        let rotated = service.refresh(&pair.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, pair.refresh_token);

        // Reusing the old token fails
        assert_unauthenticated(service.refresh(&pair.refresh_token).await, INVALID_REFRESH);

        // The rotated one works
        assert!(service.refresh(&rotated.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let service = service();
        service
            .register(register_request("ada@example.com"))
            .await
            .unwrap();
        let pair = service.login("ada@example.com", "password123").await.unwrap();

        assert_unauthenticated(service.refresh(&pair.access_token).await, INVALID_REFRESH);
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh() {
        let service = service();
        let user = service
            .register(register_request("ada@example.com"))
            .await
            .unwrap();
        let pair = service.login("ada@example.com", "password123").await.unwrap();

        service.logout(user.id()).await.unwrap();

        assert_unauthenticated(service.refresh(&pair.refresh_token).await, INVALID_REFRESH);
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let captured = Arc::new(Mutex::new(None::<String>));
        let sink = captured.clone();

        let mut notifier = MockNotifier::new();
        notifier
            .expect_send_password_reset()
            .times(1)
            .returning(move |_, token| {
                *sink.lock().unwrap() = Some(token.to_string());
                Ok(())
            });

        let service = service_with(notifier);
        service
            .register(register_request("ada@example.com"))
            .await
            .unwrap();
        let pair = service.login("ada@example.com", "password123").await.unwrap();

        service
            .request_password_reset("ada@example.com")
            .await
            .unwrap();
        let token = captured.lock().unwrap().clone().unwrap();

        service.reset_password(&token, "brand-new-pass").await.unwrap();

        // New password works, old does not
        assert!(service.login("ada@example.com", "brand-new-pass").await.is_ok());
        assert!(service.login("ada@example.com", "password123").await.is_err());

        // Token is single use: the password hash changed
        assert_unauthenticated(
            service.reset_password(&token, "another-pass").await,
            INVALID_RESET,
        );

        // Sessions opened before the reset are gone
        assert!(service.refresh(&pair.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_password_reset_unknown_email_is_silent() {
        let service = service();

        service
            .request_password_reset("nobody@example.com")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_password_reset_send_failure_is_swallowed() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send_password_reset()
            .returning(|_, _| Err(DomainError::notification("mail api down")));

        let service = service_with(notifier);
        service
            .register(register_request("ada@example.com"))
            .await
            .unwrap();

        assert!(service
            .request_password_reset("ada@example.com")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_reset_with_garbage_token() {
        let service = service();

        assert_unauthenticated(
            service.reset_password("garbage", "new-password").await,
            INVALID_RESET,
        );
    }
}
