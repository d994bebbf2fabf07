//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::team::TeamId;
use crate::domain::user::{User, UserId, UserRecord, UserRepository};
use crate::domain::DomainError;
use crate::infrastructure::storage::{is_unique_violation, storage_error};

/// Column list shared by every user query
pub(crate) const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, \
     github, linkedin, comment, cv, paid_caution, is_admin, is_team_owner, team_id, vote_id, \
     image_agreement, subscribe_formation, refresh_token_hash, created_at, updated_at";

/// PostgreSQL implementation of UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to get user", e))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to get user by email", e))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)"
        ))
        .bind(user.id().as_uuid())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.github())
        .bind(user.linkedin())
        .bind(user.comment())
        .bind(user.cv())
        .bind(user.paid_caution())
        .bind(user.is_admin())
        .bind(user.is_team_owner())
        .bind(user.team_id().map(|id| *id.as_uuid()))
        .bind(user.vote_id().map(|id| *id.as_uuid()))
        .bind(user.image_agreement())
        .bind(user.subscribe_formation())
        .bind(user.refresh_token_hash())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict(format!("Email '{}' is already registered", user.email()))
            } else {
                storage_error("Failed to create user", e)
            }
        })?;

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        // team_id, is_team_owner and vote_id belong to the membership store
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, first_name = $4, last_name = $5,
                github = $6, linkedin = $7, comment = $8, cv = $9, paid_caution = $10,
                is_admin = $11, image_agreement = $12, subscribe_formation = $13,
                refresh_token_hash = $14, updated_at = $15
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id().as_uuid())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.github())
        .bind(user.linkedin())
        .bind(user.comment())
        .bind(user.cv())
        .bind(user.paid_caution())
        .bind(user.is_admin())
        .bind(user.image_agreement())
        .bind(user.subscribe_formation())
        .bind(user.refresh_token_hash())
        .bind(user.updated_at())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict(format!("Email '{}' is already registered", user.email()))
            } else {
                storage_error("Failed to update user", e)
            }
        })?;

        match row {
            Some(row) => row_to_user(&row),
            None => Err(DomainError::not_found(format!(
                "User '{}' not found",
                user.id()
            ))),
        }
    }

    async fn delete(&self, id: UserId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete user", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list users", e))?;

        rows.iter().map(row_to_user).collect()
    }

    async fn list_by_team(&self, team_id: TeamId) -> Result<Vec<User>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE team_id = $1 ORDER BY created_at"
        ))
        .bind(team_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list team members", e))?;

        rows.iter().map(row_to_user).collect()
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to count users", e))?;

        Ok(count as usize)
    }

    async fn swap_refresh_token_hash(
        &self,
        id: UserId,
        expected: &str,
        replacement: Option<String>,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $3, updated_at = NOW()
            WHERE id = $1 AND refresh_token_hash = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(expected)
        .bind(replacement)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to rotate refresh token", e))?;

        Ok(result.rows_affected() == 1)
    }
}

/// Rebuild a user from a row selected with [`USER_COLUMNS`]
pub(crate) fn row_to_user(row: &PgRow) -> Result<User, DomainError> {
    let column = |e: sqlx::Error| storage_error("Invalid user row", e);

    let id: Uuid = row.try_get("id").map_err(column)?;
    let team_id: Option<Uuid> = row.try_get("team_id").map_err(column)?;
    let vote_id: Option<Uuid> = row.try_get("vote_id").map_err(column)?;

    Ok(User::restore(UserRecord {
        id: UserId::from(id),
        email: row.try_get("email").map_err(column)?,
        password_hash: row.try_get("password_hash").map_err(column)?,
        first_name: row.try_get("first_name").map_err(column)?,
        last_name: row.try_get("last_name").map_err(column)?,
        github: row.try_get("github").map_err(column)?,
        linkedin: row.try_get("linkedin").map_err(column)?,
        comment: row.try_get("comment").map_err(column)?,
        cv: row.try_get("cv").map_err(column)?,
        paid_caution: row.try_get("paid_caution").map_err(column)?,
        is_admin: row.try_get("is_admin").map_err(column)?,
        is_team_owner: row.try_get("is_team_owner").map_err(column)?,
        team_id: team_id.map(TeamId::from),
        vote_id: vote_id.map(TeamId::from),
        image_agreement: row.try_get("image_agreement").map_err(column)?,
        subscribe_formation: row.try_get("subscribe_formation").map_err(column)?,
        refresh_token_hash: row.try_get("refresh_token_hash").map_err(column)?,
        created_at: row.try_get("created_at").map_err(column)?,
        updated_at: row.try_get("updated_at").map_err(column)?,
    }))
}
