//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{User, UserId};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// Repository trait for user storage
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Get a user by their ID
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError>;

    /// Get a user by their normalized email (for login)
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Create a new user; a taken email is a conflict
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Update an existing user's account fields.
    ///
    /// Team, ownership and vote are left as stored; the returned user carries
    /// the stored values.
    async fn update(&self, user: &User) -> Result<User, DomainError>;

    /// Delete a user
    async fn delete(&self, id: UserId) -> Result<bool, DomainError>;

    /// List all users, oldest first
    async fn list(&self) -> Result<Vec<User>, DomainError>;

    /// Members of a team, oldest first
    async fn list_by_team(&self, team_id: TeamId) -> Result<Vec<User>, DomainError>;

    async fn count(&self) -> Result<usize, DomainError>;

    /// Replace the stored refresh token hash only if it still equals `expected`.
    ///
    /// Returns `false` when the stored value differs (token reused or revoked).
    async fn swap_refresh_token_hash(
        &self,
        id: UserId,
        expected: &str,
        replacement: Option<String>,
    ) -> Result<bool, DomainError>;

    /// Check if an email is already registered
    async fn email_exists(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.get_by_email(email).await?.is_some())
    }
}
