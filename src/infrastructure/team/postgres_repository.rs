//! PostgreSQL team repository implementation

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::team::{Team, TeamId, TeamRecord, TeamRepository};
use crate::domain::DomainError;
use crate::infrastructure::storage::{is_unique_violation, storage_error, violated_constraint};

pub(crate) const TEAM_COLUMNS: &str =
    "id, name, description, idea, token, valid, created_at, updated_at";

/// PostgreSQL implementation of TeamRepository
#[derive(Debug, Clone)]
pub struct PostgresTeamRepository {
    pool: PgPool,
}

impl PostgresTeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<Team>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to get team", e))?;

        row.as_ref().map(row_to_team).transpose()
    }
}

/// Map a write failure, turning unique violations into conflicts
pub(crate) fn team_write_error(team: &Team, context: &str, error: sqlx::Error) -> DomainError {
    if !is_unique_violation(&error) {
        return storage_error(context, error);
    }

    match violated_constraint(&error).as_deref() {
        Some("teams_token_key") => DomainError::conflict("Team token collision"),
        _ => DomainError::conflict(format!("Team name '{}' is already taken", team.name())),
    }
}

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn get(&self, id: TeamId) -> Result<Option<Team>, DomainError> {
        let row = sqlx::query(&format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to get team", e))?;

        row.as_ref().map(row_to_team).transpose()
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<Team>, DomainError> {
        self.fetch_one_by("token", token).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Team>, DomainError> {
        self.fetch_one_by("name", name).await
    }

    async fn create(&self, team: Team) -> Result<Team, DomainError> {
        insert_team(&self.pool, &team)
            .await
            .map_err(|e| team_write_error(&team, "Failed to create team", e))?;

        Ok(team)
    }

    async fn update(&self, team: &Team) -> Result<Team, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE teams
            SET name = $2, description = $3, idea = $4, updated_at = $5
            WHERE id = $1
            RETURNING {TEAM_COLUMNS}
            "#
        ))
        .bind(team.id().as_uuid())
        .bind(team.name())
        .bind(team.description())
        .bind(team.idea())
        .bind(team.updated_at())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| team_write_error(team, "Failed to update team", e))?;

        match row {
            Some(row) => row_to_team(&row),
            None => Err(DomainError::not_found(format!(
                "Team '{}' not found",
                team.id()
            ))),
        }
    }

    async fn delete(&self, id: TeamId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete team", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<Team>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list teams", e))?;

        rows.iter().map(row_to_team).collect()
    }

    async fn set_validity(&self, id: TeamId, valid: bool) -> Result<(), DomainError> {
        let result =
            sqlx::query("UPDATE teams SET valid = $2, updated_at = NOW() WHERE id = $1")
                .bind(id.as_uuid())
                .bind(valid)
                .execute(&self.pool)
                .await
                .map_err(|e| storage_error("Failed to update team validity", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("Team '{}' not found", id)));
        }

        Ok(())
    }
}

/// Insert a team row using any executor (pool or open transaction)
pub(crate) async fn insert_team<'e, E>(executor: E, team: &Team) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query(&format!(
        "INSERT INTO teams ({TEAM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
    ))
    .bind(team.id().as_uuid())
    .bind(team.name())
    .bind(team.description())
    .bind(team.idea())
    .bind(team.token())
    .bind(team.is_valid())
    .bind(team.created_at())
    .bind(team.updated_at())
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) fn row_to_team(row: &PgRow) -> Result<Team, DomainError> {
    let column = |e: sqlx::Error| storage_error("Invalid team row", e);
    let id: Uuid = row.try_get("id").map_err(column)?;

    Ok(Team::restore(TeamRecord {
        id: TeamId::from(id),
        name: row.try_get("name").map_err(column)?,
        description: row.try_get("description").map_err(column)?,
        idea: row.try_get("idea").map_err(column)?,
        token: row.try_get("token").map_err(column)?,
        valid: row.try_get("valid").map_err(column)?,
        created_at: row.try_get("created_at").map_err(column)?,
        updated_at: row.try_get("updated_at").map_err(column)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_errors_stay_storage_errors() {
        let team = Team::new(TeamId::generate(), "Rockets", "", "", "tok").unwrap();
        let error = team_write_error(&team, "Failed to create team", sqlx::Error::PoolTimedOut);
        assert!(matches!(error, DomainError::Storage { .. }));
    }
}
