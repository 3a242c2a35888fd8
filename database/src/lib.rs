//! Database layer with SQLite

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::str::FromStr;
use ams_core::{Error, Result};
use tracing::info;

// Export models and queries
pub mod models;
pub mod queries;

pub use models::*;
pub use queries::*;

// Re-export sqlx types for convenience
pub use sqlx::{self, Pool as SqlxPool, Sqlite as SqlxSqlite};

// Embed migrations at compile time
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection
    pub async fn new(database_url: &str) -> Result<Self> {
        info!(url = %database_url, "Connecting to database");

        // Make sure the directory holding the database file exists
        if let Some(path) = database_url.strip_prefix("sqlite:") {
            let path = path.trim_start_matches("//");
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    info!(dir = ?parent, "Creating database directory");
                    std::fs::create_dir_all(parent).map_err(|e| {
                        Error::DatabaseError(format!("Failed to create database directory: {}", e))
                    })?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| Error::DatabaseError(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::DatabaseError(format!("Failed to connect: {}", e)))?;

        Ok(Self { pool })
    }

    /// Private in-memory database with migrations applied.
    ///
    /// The pool is limited to a single connection since every SQLite
    /// memory connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| Error::DatabaseError(format!("Failed to connect: {}", e)))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");

        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| Error::DatabaseError(format!("Failed to run migrations: {}", e)))?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

/// Map a sqlx error, turning a missing row into [`Error::NotFound`]
pub(crate) fn map_row_error(err: sqlx::Error, resource: &str) -> Error {
    match err {
        sqlx::Error::RowNotFound => Error::NotFound(resource.to_string()),
        other => Error::DatabaseError(other.to_string()),
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> Pool<Sqlite> {
    Database::in_memory().await.unwrap().pool
}
