//! SQLite-backed storage for completed workouts
//!
//! Thin wrapper around a `sqlx` connection pool. Opening the database is the
//! one operation in this crate allowed to fail hard: callers treat an
//! unusable pool as a startup error rather than degrading to memory-only
//! operation.

use crate::storage::migrations;
use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;

/// Pool size for the on-disk database
const POOL_SIZE: u32 = 5;

/// Where and how to open the workout database
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path of the database file, or `:memory:`
    pub path: PathBuf,
    /// Connection-pool size
    pub max_connections: u32,
    /// Apply pending schema migrations on connect
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: POOL_SIZE,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// Config for a database at the given path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Config for an in-memory database, used by tests
    ///
    /// SQLite gives every connection its own private memory store, so the
    /// pool is capped at a single connection.
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            max_connections: 1,
            auto_migrate: true,
        }
    }
}

/// Default location of the workout database
pub fn default_database_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("liftlog").join("liftlog.db"),
        None => PathBuf::from("liftlog.db"),
    }
}

/// Shared handle to the workout database
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database, creating the file and schema as needed
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        if config.path.as_os_str() != ":memory:" {
            if let Some(dir) = config.path.parent() {
                std::fs::create_dir_all(dir).with_context(|| {
                    format!("Failed to create database directory: {}", dir.display())
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database: {}", config.path.display()))?;

        let db = Self { pool };
        if config.auto_migrate {
            db.migrate().await?;
        }
        Ok(db)
    }

    /// Open the database at its default location
    pub async fn default() -> Result<Self> {
        Self::new(DatabaseConfig::default()).await
    }

    /// Open an in-memory database, used by tests
    pub async fn in_memory() -> Result<Self> {
        Self::new(DatabaseConfig::in_memory()).await
    }

    /// The underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        migrations::run_migrations(&self.pool)
            .await
            .context("Failed to run database migrations")
    }

    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
