//! In-memory membership writes
//!
//! Every operation holds the shared write lock for its whole duration, so
//! user and team rows change together or not at all.

use async_trait::async_trait;

use crate::domain::membership::MembershipMutator;
use crate::domain::team::{Team, TeamId};
use crate::domain::user::{MembershipState, User, UserId};
use crate::domain::DomainError;
use crate::infrastructure::storage::InMemoryDatabase;
use crate::infrastructure::team::ensure_unique;

#[derive(Debug, Clone, Default)]
pub struct InMemoryMembershipStore {
    db: InMemoryDatabase,
}

impl InMemoryMembershipStore {
    pub fn new(db: InMemoryDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MembershipMutator for InMemoryMembershipStore {
    async fn create_team_with_owner(
        &self,
        team: Team,
        owner: UserId,
    ) -> Result<Team, DomainError> {
        let mut tables = self.db.write().await;

        if tables.user_mut(owner)?.team_id().is_some() {
            return Err(DomainError::state_violation("user already has a team"));
        }
        if tables.teams.contains_key(&team.id()) {
            return Err(DomainError::conflict(format!(
                "Team '{}' already exists",
                team.id()
            )));
        }
        ensure_unique(&tables, &team)?;

        tables.teams.insert(team.id(), team.clone());
        tables.user_mut(owner)?.join_team(team.id(), true);

        Ok(team)
    }

    async fn assign_member(&self, team_id: TeamId, user_id: UserId) -> Result<User, DomainError> {
        let mut tables = self.db.write().await;
        tables.require_team(team_id)?;

        let user = tables.user_mut(user_id)?;
        if user.team_id().is_some() {
            return Err(DomainError::state_violation("user already has a team"));
        }

        user.join_team(team_id, false);
        Ok(user.clone())
    }

    async fn release_member(&self, user_id: UserId) -> Result<User, DomainError> {
        let mut tables = self.db.write().await;
        let user = tables.user_mut(user_id)?;

        user.leave_team();
        Ok(user.clone())
    }

    async fn transfer_ownership(&self, from: UserId, to: UserId) -> Result<(), DomainError> {
        let mut tables = self.db.write().await;

        let current = tables.user_mut(from)?.membership();
        let MembershipState::Owner(team_id) = current else {
            return Err(DomainError::forbidden(
                "only the team owner can transfer ownership",
            ));
        };

        if !tables.user_mut(to)?.is_member_of(team_id) {
            return Err(DomainError::state_violation(
                "new owner must be a member of the team",
            ));
        }

        tables.user_mut(from)?.set_team_owner(false);
        tables.user_mut(to)?.set_team_owner(true);
        Ok(())
    }

    async fn record_vote(
        &self,
        user_id: UserId,
        team_id: Option<TeamId>,
    ) -> Result<User, DomainError> {
        let mut tables = self.db.write().await;
        if let Some(team_id) = team_id {
            tables.require_team(team_id)?;
        }

        let user = tables.user_mut(user_id)?;
        user.set_vote(team_id);
        Ok(user.clone())
    }

    async fn dissolve_team(&self, team_id: TeamId) -> Result<(), DomainError> {
        let mut tables = self.db.write().await;
        tables.require_team(team_id)?;

        for user in tables.users.values_mut() {
            if user.is_member_of(team_id) {
                user.leave_team();
            }
            if user.vote_id() == Some(team_id) {
                user.set_vote(None);
            }
        }

        tables.teams.remove(&team_id);
        Ok(())
    }
}
