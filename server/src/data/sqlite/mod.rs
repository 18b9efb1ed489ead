//! SQLite database service
//!
//! Centralized database management for the transactional store:
//! - WAL mode for concurrent reads during writes (file-backed databases)
//! - Foreign keys enforced (the tenancy chain relies on them)
//! - Schema versioning with an incremental migration runner
//!
//! All schema definitions and migrations are managed here.

pub mod error;
mod migrations;
pub mod repositories;
mod repository_impl;
pub mod schema;

pub use error::SqliteError;
pub use sqlx::SqlitePool;

use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};

use crate::core::config::DatabaseConfig;
use crate::core::constants::{SQLITE_BUSY_TIMEOUT_SECS, SQLITE_MAX_CONNECTIONS};

/// SQLite database service
///
/// Handles database initialization, connection pooling, and migrations.
/// Created once at server startup and shared across all modules.
pub struct SqliteService {
    pool: SqlitePool,
}

impl SqliteService {
    /// Initialize the database service
    ///
    /// Creates the database file if it doesn't exist, configures connection
    /// options, and runs any pending migrations. `:memory:` is supported for
    /// tests and ephemeral deployments; in-memory databases are pinned to a
    /// single connection so every handle sees the same data.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, SqliteError> {
        let in_memory = config.path == ":memory:";

        let mut options = SqliteConnectOptions::new()
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(SQLITE_BUSY_TIMEOUT_SECS));

        options = if in_memory {
            options.in_memory(true)
        } else {
            options
                .filename(&config.path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };

        // An in-memory database lives and dies with its connection: pin the
        // pool to one connection and keep it open.
        let (min_connections, max_connections) = if in_memory {
            (1, 1)
        } else {
            (0, SQLITE_MAX_CONNECTIONS)
        };

        let pool = SqlitePoolOptions::new()
            .min_connections(min_connections)
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        migrations::run_migrations(&pool).await?;

        tracing::debug!(path = %config.path, "SqliteService initialized");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a SqliteService from an existing pool (primarily for testing)
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("SQLite pool closed");
    }
}
