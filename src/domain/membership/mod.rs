//! Team membership seams
//!
//! Membership changes touch user rows and team rows together. The
//! [`MembershipMutator`] trait groups those multi-row writes so every storage
//! backend can apply each one atomically. [`TeamLookup`] is the narrow view of
//! the team state machine needed by user operations (caution changes, account
//! deletion) without depending on the full team service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::team::{Team, TeamId};
use crate::domain::user::{User, UserId};
use crate::domain::DomainError;

/// Atomic multi-row membership writes
#[async_trait]
pub trait MembershipMutator: Send + Sync + Debug {
    /// Insert `team` and make `owner` its owner in one step
    async fn create_team_with_owner(&self, team: Team, owner: UserId)
        -> Result<Team, DomainError>;

    /// Put a user into a team as a plain member
    async fn assign_member(&self, team_id: TeamId, user_id: UserId) -> Result<User, DomainError>;

    /// Clear `team_id` and `is_team_owner` on a user
    async fn release_member(&self, user_id: UserId) -> Result<User, DomainError>;

    /// Move the owner flag from `from` to `to`; both must be in the same team
    async fn transfer_ownership(&self, from: UserId, to: UserId) -> Result<(), DomainError>;

    /// Set or clear the team a user votes for
    async fn record_vote(
        &self,
        user_id: UserId,
        team_id: Option<TeamId>,
    ) -> Result<User, DomainError>;

    /// Release every member, drop every vote for the team, then delete it
    async fn dissolve_team(&self, team_id: TeamId) -> Result<(), DomainError>;
}

/// Read and validity access to teams, consumed by user operations
#[async_trait]
pub trait TeamLookup: Send + Sync + Debug {
    async fn find_team(&self, team_id: TeamId) -> Result<Option<Team>, DomainError>;

    /// Recompute and persist the validity flag, returning the new value
    async fn refresh_validity(&self, team_id: TeamId) -> Result<bool, DomainError>;
}

/// What happens when a team owner leaves while teammates remain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OwnerLeavePolicy {
    /// Refuse; the owner has to transfer ownership or delete the team
    #[default]
    Reject,
    /// Hand ownership to the longest-registered remaining member
    PromoteOldestMember,
}

impl std::fmt::Display for OwnerLeavePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reject => write!(f, "reject"),
            Self::PromoteOldestMember => write!(f, "promote_oldest_member"),
        }
    }
}
