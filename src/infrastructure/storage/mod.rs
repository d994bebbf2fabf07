//! Storage infrastructure - in-memory tables and PostgreSQL plumbing

mod in_memory;
pub mod migrations;
mod postgres;

pub use in_memory::{InMemoryDatabase, Tables};
pub use migrations::{run_migrations, Migration, PostgresMigrator};
pub use postgres::{is_unique_violation, storage_error, violated_constraint, PostgresConfig};
