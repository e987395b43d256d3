mod chunk_queries;
mod config_queries;
mod doc_queries;
mod query;
mod zcap_queries;

use std::ops::Deref;
use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use common::error::StoreError;

pub use chunk_queries::ChunkRecord;
pub use config_queries::ConfigRecord;
pub use doc_queries::DocRecord;

/// SQLite connection pool behind every store operation.
#[derive(Clone, Debug)]
pub struct Database(SqlitePool);

impl Database {
    /// Open (creating if missing) a database at `path` and migrate it.
    pub async fn connect(path: &Path) -> Result<Self, DatabaseSetupError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(DatabaseSetupError::CreateDirectory)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(DatabaseSetupError::Unavailable)?;

        Self::migrate(&pool).await?;
        Ok(Database(pool))
    }

    /// Create an in-memory database. Used by tests and the default
    /// development configuration.
    pub async fn in_memory() -> Result<Self, DatabaseSetupError> {
        let options = SqliteConnectOptions::new().filename(":memory:");

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(DatabaseSetupError::Unavailable)?;

        Self::migrate(&pool).await?;
        Ok(Database(pool))
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), DatabaseSetupError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        Ok(())
    }

    /// Cheap liveness probe for the readiness endpoint.
    pub async fn is_ready(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.0).await.is_ok()
    }
}

impl Deref for Database {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseSetupError {
    #[error("error occurred while attempting database migration: {0}")]
    MigrationFailed(#[from] sqlx::migrate::MigrateError),

    #[error("unable to perform initial connection and check of the database: {0}")]
    Unavailable(sqlx::Error),

    #[error("unable to create the database directory: {0}")]
    CreateDirectory(std::io::Error),
}

/// Classify a write failure: unique-index violations surface as
/// duplicates of `what`, anything else is an internal fault.
pub(crate) fn classify_write(err: sqlx::Error, what: &'static str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            return StoreError::Duplicate(what.to_string());
        }
    }
    StoreError::Internal(err.to_string())
}

pub(crate) fn internal(err: sqlx::Error) -> StoreError {
    StoreError::Internal(err.to_string())
}

/// Sequences persist as 64-bit integers but are bounded to what JSON
/// number consumers can represent without loss.
pub(crate) const MAX_SEQUENCE: u64 = (1 << 53) - 1;

pub(crate) fn check_sequence(sequence: u64) -> Result<(), StoreError> {
    if sequence > MAX_SEQUENCE {
        return Err(StoreError::Data(
            "sequence exceeds the maximum safe value".to_string(),
        ));
    }
    Ok(())
}
