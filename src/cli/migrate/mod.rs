//! Migrate command - applies PostgreSQL migrations

use tracing::info;

use crate::config::StorageBackend;
use crate::infrastructure::storage::{run_migrations, PostgresConfig};

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    if config.storage.backend != StorageBackend::Postgres {
        anyhow::bail!("migrate requires storage.backend = \"postgres\"");
    }

    let pool = PostgresConfig::from(&config.storage).connect().await?;
    let applied = run_migrations(&pool).await?;

    info!(applied, "Migrations complete");
    Ok(())
}
