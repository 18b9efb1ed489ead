//! Data storage layer
//!
//! Provides the transactional store for the application:
//! - `sqlite` - embedded SQLite backend (schema, migrations, repositories)
//! - `types` - row and input types shared across the layer
//! - `traits` - the repository trait the services program against
//! - `error` - unified error type
//!
//! The persistence layer is a capability: everything above it goes through
//! `TransactionalRepository`, so the concrete backend stays swappable.

pub mod error;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use error::DataError;
pub use sqlite::SqliteService;
pub use traits::TransactionalRepository;

use std::sync::Arc;

use crate::core::config::DatabaseConfig;

/// Transactional database service
///
/// Wraps the backend-specific service and hands out the repository trait
/// object. Stored as Arc so it can be shared across request handlers.
pub enum TransactionalService {
    /// SQLite backend (embedded)
    Sqlite(Arc<SqliteService>),
}

impl TransactionalService {
    /// Initialize the transactional service
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DataError> {
        let service = SqliteService::init(config).await?;
        Ok(Self::Sqlite(Arc::new(service)))
    }

    /// Build a service from an existing SQLite pool (primarily for testing)
    pub fn from_pool(pool: sqlx::SqlitePool) -> Self {
        Self::Sqlite(Arc::new(SqliteService::from_pool(pool)))
    }

    /// Get the repository interface for this backend
    pub fn repository(&self) -> &dyn TransactionalRepository {
        match self {
            Self::Sqlite(service) => service,
        }
    }

    /// Get the underlying SQLite pool (for direct access when needed)
    pub fn pool(&self) -> &sqlx::SqlitePool {
        match self {
            Self::Sqlite(service) => service.pool(),
        }
    }

    /// Close the backing pool gracefully
    pub async fn close(&self) {
        match self {
            Self::Sqlite(service) => service.close().await,
        }
    }
}
