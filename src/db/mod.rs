pub mod backend;
pub mod instrumented;
pub mod sqlite;

use anyhow::Result;
use std::sync::Arc;
use thiserror::Error;

pub use backend::{
    DatabaseBackend, FilterEmails, FilterUsers, FILTER_EMAILS_DEFAULT_LIMIT,
    FILTER_USERS_DEFAULT_LIMIT,
};
pub use instrumented::InstrumentedDatabase;
pub use sqlite::SqliteBackend;

/// Database connection type - polymorphic over backends
pub type Database = Arc<dyn DatabaseBackend>;

/// Library failures raised while talking to the database
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not get connection from pool; {0}")]
    Pool(#[from] r2d2::Error),

    #[error("sqlite; {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage task failed; {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<StoreError> for crate::errors::Error {
    fn from(err: StoreError) -> Self {
        Self::foreign(err)
    }
}

impl From<r2d2::Error> for crate::errors::Error {
    fn from(err: r2d2::Error) -> Self {
        StoreError::from(err).into()
    }
}

impl From<rusqlite::Error> for crate::errors::Error {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::from(err).into()
    }
}

impl From<tokio::task::JoinError> for crate::errors::Error {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::from(err).into()
    }
}

/// Initialize the SQLite backend, wrapped with query metrics
pub fn init_database(config: &crate::config::DatabaseConfig) -> Result<Database> {
    tracing::info!(path = %config.path, "Initializing SQLite backend");
    let pool = sqlite::connection::create_pool(&config.path, config.max_connections)?;
    let backend = SqliteBackend::new(pool)?;
    Ok(Arc::new(InstrumentedDatabase::new(Arc::new(backend))) as Database)
}
