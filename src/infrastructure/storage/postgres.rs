//! PostgreSQL connection pooling and error mapping

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::StorageSettings;
use crate::domain::DomainError;

/// PostgreSQL pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/hackathon".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Open a connection pool
    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .connect(&self.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
    }
}

impl From<&StorageSettings> for PostgresConfig {
    fn from(settings: &StorageSettings) -> Self {
        Self::new(settings.database_url.clone()).with_max_connections(settings.max_connections)
    }
}

/// Whether an sqlx error is a unique constraint violation
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// Name of the violated constraint, when the database reports one
pub fn violated_constraint(error: &sqlx::Error) -> Option<String> {
    error
        .as_database_error()
        .and_then(|db| db.constraint().map(str::to_string))
}

/// Wrap an sqlx error as a storage error with context
pub fn storage_error(context: &str, error: sqlx::Error) -> DomainError {
    DomainError::storage(format!("{}: {}", context, error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings() {
        let settings = StorageSettings {
            database_url: "postgres://db/hack".to_string(),
            max_connections: 3,
            ..Default::default()
        };

        let config = PostgresConfig::from(&settings);
        assert_eq!(config.url, "postgres://db/hack");
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.min_connections, 1);
    }

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        let error = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&error));
        assert!(violated_constraint(&error).is_none());
        assert!(storage_error("Failed to get user", error)
            .to_string()
            .contains("Failed to get user"));
    }
}
