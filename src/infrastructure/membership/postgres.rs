//! PostgreSQL membership writes
//!
//! Multi-statement operations run inside one transaction; an early return
//! drops the transaction, which rolls it back.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::membership::MembershipMutator;
use crate::domain::team::{Team, TeamId};
use crate::domain::user::{MembershipState, User, UserId};
use crate::domain::DomainError;
use crate::infrastructure::storage::storage_error;
use crate::infrastructure::team::{insert_team, team_write_error};
use crate::infrastructure::user::{row_to_user, USER_COLUMNS};

#[derive(Debug, Clone)]
pub struct PostgresMembershipStore {
    pool: PgPool,
}

impl PostgresMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
}

fn user_not_found(id: UserId) -> DomainError {
    DomainError::not_found(format!("User '{}' not found", id))
}

fn team_not_found(id: TeamId) -> DomainError {
    DomainError::not_found(format!("Team '{}' not found", id))
}

#[async_trait]
impl MembershipMutator for PostgresMembershipStore {
    async fn create_team_with_owner(
        &self,
        team: Team,
        owner: UserId,
    ) -> Result<Team, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("Failed to begin transaction", e))?;

        insert_team(&mut *tx, &team)
            .await
            .map_err(|e| team_write_error(&team, "Failed to create team", e))?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET team_id = $2, is_team_owner = TRUE, updated_at = NOW()
            WHERE id = $1 AND team_id IS NULL
            "#,
        )
        .bind(owner.as_uuid())
        .bind(team.id().as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_error("Failed to assign team owner", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::state_violation("user already has a team"));
        }

        tx.commit()
            .await
            .map_err(|e| storage_error("Failed to commit team creation", e))?;

        Ok(team)
    }

    async fn assign_member(&self, team_id: TeamId, user_id: UserId) -> Result<User, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET team_id = $2, is_team_owner = FALSE, vote_id = NULLIF(vote_id, $2),
                updated_at = NOW()
            WHERE id = $1 AND team_id IS NULL
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id.as_uuid())
        .bind(team_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                team_not_found(team_id)
            } else {
                storage_error("Failed to assign member", e)
            }
        })?;

        match row {
            Some(row) => row_to_user(&row),
            None => Err(DomainError::state_violation("user already has a team")),
        }
    }

    async fn release_member(&self, user_id: UserId) -> Result<User, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET team_id = NULL, is_team_owner = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to release member", e))?;

        match row {
            Some(row) => row_to_user(&row),
            None => Err(user_not_found(user_id)),
        }
    }

    async fn transfer_ownership(&self, from: UserId, to: UserId) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("Failed to begin transaction", e))?;

        let mut locked = Vec::with_capacity(2);
        for id in [from, to] {
            let row = sqlx::query(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
            ))
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| storage_error("Failed to lock user", e))?
            .ok_or_else(|| user_not_found(id))?;
            locked.push(row_to_user(&row)?);
        }

        let MembershipState::Owner(team_id) = locked[0].membership() else {
            return Err(DomainError::forbidden(
                "only the team owner can transfer ownership",
            ));
        };
        if !locked[1].is_member_of(team_id) {
            return Err(DomainError::state_violation(
                "new owner must be a member of the team",
            ));
        }

        sqlx::query(
            r#"
            UPDATE users
            SET is_team_owner = (id = $2), updated_at = NOW()
            WHERE id IN ($1, $2)
            "#,
        )
        .bind(from.as_uuid())
        .bind(to.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_error("Failed to transfer ownership", e))?;

        tx.commit()
            .await
            .map_err(|e| storage_error("Failed to commit ownership transfer", e))
    }

    async fn record_vote(
        &self,
        user_id: UserId,
        team_id: Option<TeamId>,
    ) -> Result<User, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET vote_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id.as_uuid())
        .bind(team_id.map(|id| *id.as_uuid()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match team_id {
            Some(team_id) if is_foreign_key_violation(&e) => team_not_found(team_id),
            _ => storage_error("Failed to record vote", e),
        })?;

        match row {
            Some(row) => row_to_user(&row),
            None => Err(user_not_found(user_id)),
        }
    }

    async fn dissolve_team(&self, team_id: TeamId) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("Failed to begin transaction", e))?;

        sqlx::query(
            r#"
            UPDATE users
            SET team_id = NULL, is_team_owner = FALSE, updated_at = NOW()
            WHERE team_id = $1
            "#,
        )
        .bind(team_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_error("Failed to release team members", e))?;

        sqlx::query("UPDATE users SET vote_id = NULL, updated_at = NOW() WHERE vote_id = $1")
            .bind(team_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error("Failed to clear votes", e))?;

        let deleted = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(team_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error("Failed to delete team", e))?;

        if deleted.rows_affected() == 0 {
            return Err(team_not_found(team_id));
        }

        tx.commit()
            .await
            .map_err(|e| storage_error("Failed to commit team dissolution", e))
    }
}
