//! In-memory team repository implementation

use async_trait::async_trait;

use crate::domain::team::{Team, TeamId, TeamRepository};
use crate::domain::DomainError;
use crate::infrastructure::storage::{InMemoryDatabase, Tables};

/// In-memory implementation of TeamRepository
#[derive(Debug, Clone, Default)]
pub struct InMemoryTeamRepository {
    db: InMemoryDatabase,
}

impl InMemoryTeamRepository {
    /// Create a repository over the shared tables
    pub fn new(db: InMemoryDatabase) -> Self {
        Self { db }
    }
}

/// Reject a team whose name or token collides with another team
pub(crate) fn ensure_unique(tables: &Tables, team: &Team) -> Result<(), DomainError> {
    for other in tables.teams.values().filter(|t| t.id() != team.id()) {
        if other.name() == team.name() {
            return Err(DomainError::conflict(format!(
                "Team name '{}' is already taken",
                team.name()
            )));
        }
        if other.token() == team.token() {
            return Err(DomainError::conflict("Team token collision"));
        }
    }
    Ok(())
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn get(&self, id: TeamId) -> Result<Option<Team>, DomainError> {
        Ok(self.db.read().await.teams.get(&id).cloned())
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<Team>, DomainError> {
        let tables = self.db.read().await;
        Ok(tables.teams.values().find(|t| t.token() == token).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Team>, DomainError> {
        let tables = self.db.read().await;
        Ok(tables.teams.values().find(|t| t.name() == name).cloned())
    }

    async fn create(&self, team: Team) -> Result<Team, DomainError> {
        let mut tables = self.db.write().await;

        if tables.teams.contains_key(&team.id()) {
            return Err(DomainError::conflict(format!(
                "Team '{}' already exists",
                team.id()
            )));
        }
        ensure_unique(&tables, &team)?;

        tables.teams.insert(team.id(), team.clone());
        Ok(team)
    }

    async fn update(&self, team: &Team) -> Result<Team, DomainError> {
        let mut tables = self.db.write().await;

        let stored = tables
            .teams
            .get(&team.id())
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", team.id())))?;

        // Validity is owned by set_validity; keep the stored flag
        let updated = team.clone().with_valid(stored.is_valid());
        ensure_unique(&tables, &updated)?;

        tables.teams.insert(updated.id(), updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: TeamId) -> Result<bool, DomainError> {
        Ok(self.db.write().await.teams.remove(&id).is_some())
    }

    async fn list(&self) -> Result<Vec<Team>, DomainError> {
        let tables = self.db.read().await;
        let mut teams: Vec<Team> = tables.teams.values().cloned().collect();
        teams.sort_by_key(|t| t.created_at());
        Ok(teams)
    }

    async fn set_validity(&self, id: TeamId, valid: bool) -> Result<(), DomainError> {
        let mut tables = self.db.write().await;
        let team = tables
            .teams
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", id)))?;

        team.set_valid(valid);
        Ok(())
    }
}
