//! Local storage: SQLite connection management and schema migrations

pub mod database;
pub mod migrations;

pub use database::{default_database_path, Database, DatabaseConfig};
pub use migrations::{run_migrations, schema_version, CURRENT_VERSION};
