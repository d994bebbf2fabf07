//! Team repository trait

use async_trait::async_trait;

use super::entity::{Team, TeamId};
use crate::domain::DomainError;

/// Repository for managing teams
#[async_trait]
pub trait TeamRepository: Send + Sync + std::fmt::Debug {
    /// Get a team by ID
    async fn get(&self, id: TeamId) -> Result<Option<Team>, DomainError>;

    /// Look a team up by its join token
    async fn get_by_token(&self, token: &str) -> Result<Option<Team>, DomainError>;

    /// Look a team up by its exact name
    async fn get_by_name(&self, name: &str) -> Result<Option<Team>, DomainError>;

    /// Create a new team; a taken name or token is a conflict
    async fn create(&self, team: Team) -> Result<Team, DomainError>;

    /// Update name, description and idea of an existing team
    async fn update(&self, team: &Team) -> Result<Team, DomainError>;

    /// Delete a team by ID. Member rows are not touched.
    async fn delete(&self, id: TeamId) -> Result<bool, DomainError>;

    /// List all teams, oldest first
    async fn list(&self) -> Result<Vec<Team>, DomainError>;

    /// Persist the validity flag alone
    async fn set_validity(&self, id: TeamId, valid: bool) -> Result<(), DomainError>;

    /// Check whether a team name is taken
    async fn name_exists(&self, name: &str) -> Result<bool, DomainError> {
        Ok(self.get_by_name(name).await?.is_some())
    }
}
