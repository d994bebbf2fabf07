//! In-memory database shared by the in-memory repositories
//!
//! Users and teams live behind a single lock so multi-row membership writes
//! are atomic. Data is lost when the process terminates.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::team::{Team, TeamId};
use crate::domain::user::{User, UserId};
use crate::domain::DomainError;

/// All in-memory tables
#[derive(Debug, Default)]
pub struct Tables {
    pub users: HashMap<UserId, User>,
    pub teams: HashMap<TeamId, Team>,
}

impl Tables {
    /// Members of a team, oldest registration first
    pub fn members_of(&self, team_id: TeamId) -> Vec<&User> {
        let mut members: Vec<&User> = self
            .users
            .values()
            .filter(|u| u.is_member_of(team_id))
            .collect();
        members.sort_by_key(|u| u.created_at());
        members
    }

    pub fn user_mut(&mut self, id: UserId) -> Result<&mut User, DomainError> {
        self.users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))
    }

    pub fn require_team(&self, id: TeamId) -> Result<&Team, DomainError> {
        self.teams
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", id)))
    }
}

/// Cheaply cloneable handle to the shared tables
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().await
    }
}
