//! Application state

use ams_core::{BackupTracker, LogLevel, NotificationKind, Result, UploadStore};
use ams_database::{queries, sqlx::Pool, sqlx::Sqlite, CreateNotification, Database};
use std::sync::Arc;
use tracing::warn;

use crate::config::Config;

/// Shared application state
///
/// Cheap to clone; every field is a handle. The pool is taken from the
/// [`Database`] the state is built from.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: Pool<Sqlite>,
    pub uploads: UploadStore,
    pub backup: Arc<BackupTracker>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, database: Database) -> Result<Self> {
        std::fs::create_dir_all(&config.upload_dir)?;
        let uploads = UploadStore::new(config.upload_dir.clone());
        let pool = database.pool().clone();

        Ok(Self {
            config: Arc::new(config),
            pool,
            uploads,
            backup: Arc::new(BackupTracker::new()),
        })
    }

    /// Raise an admin notification. Failures are logged, never returned.
    pub async fn notify(&self, kind: NotificationKind, title: &str, description: &str) {
        let input = CreateNotification::new(kind, title, description);
        if let Err(e) = queries::create_notification(&self.pool, &input).await {
            warn!(error = %e, title, "Failed to create notification");
        }
    }

    /// Append to the admin activity log. Failures are logged, never returned.
    pub async fn activity(&self, level: LogLevel, message: &str) {
        if let Err(e) = queries::record_activity(&self.pool, level, message).await {
            warn!(error = %e, message, "Failed to record activity");
        }
    }
}
