//! In-memory user repository implementation

use async_trait::async_trait;

use crate::domain::team::TeamId;
use crate::domain::user::{User, UserId, UserRepository};
use crate::domain::DomainError;
use crate::infrastructure::storage::InMemoryDatabase;

/// In-memory implementation of UserRepository
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    db: InMemoryDatabase,
}

impl InMemoryUserRepository {
    /// Create a repository over the shared tables
    pub fn new(db: InMemoryDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self.db.read().await.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let tables = self.db.read().await;
        Ok(tables.users.values().find(|u| u.email() == email).cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut tables = self.db.write().await;

        if tables.users.contains_key(&user.id()) {
            return Err(DomainError::conflict(format!(
                "User with ID '{}' already exists",
                user.id()
            )));
        }

        if tables.users.values().any(|u| u.email() == user.email()) {
            return Err(DomainError::conflict(format!(
                "Email '{}' is already registered",
                user.email()
            )));
        }

        tables.users.insert(user.id(), user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let mut tables = self.db.write().await;

        let Some(stored) = tables.users.get(&user.id()) else {
            return Err(DomainError::not_found(format!(
                "User '{}' not found",
                user.id()
            )));
        };

        let mut user = user.clone();
        user.keep_membership_of(stored);

        let email_taken = tables
            .users
            .values()
            .any(|u| u.email() == user.email() && u.id() != user.id());

        if email_taken {
            return Err(DomainError::conflict(format!(
                "Email '{}' is already registered",
                user.email()
            )));
        }

        tables.users.insert(user.id(), user.clone());
        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<bool, DomainError> {
        Ok(self.db.write().await.users.remove(&id).is_some())
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        let tables = self.db.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at());
        Ok(users)
    }

    async fn list_by_team(&self, team_id: TeamId) -> Result<Vec<User>, DomainError> {
        let tables = self.db.read().await;
        Ok(tables.members_of(team_id).into_iter().cloned().collect())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.db.read().await.users.len())
    }

    async fn swap_refresh_token_hash(
        &self,
        id: UserId,
        expected: &str,
        replacement: Option<String>,
    ) -> Result<bool, DomainError> {
        let mut tables = self.db.write().await;
        let user = tables.user_mut(id)?;

        if user.refresh_token_hash() != Some(expected) {
            return Ok(false);
        }

        user.set_refresh_token_hash(replacement);
        Ok(true)
    }
}
