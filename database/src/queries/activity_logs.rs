//! Activity log queries

use ams_core::{Error, LogLevel, Result};
use anyhow::Context;
use sqlx::{Pool, Sqlite};
use tracing::instrument;

use crate::models::ActivityLog;

/// Append an entry to the activity log
#[instrument(skip(pool))]
pub async fn record_activity(pool: &Pool<Sqlite>, level: LogLevel, message: &str) -> Result<()> {
    sqlx::query("INSERT INTO activity_logs (level, message) VALUES (?, ?)")
        .bind(level.as_str())
        .bind(message)
        .execute(pool)
        .await
        .context("Failed to record activity")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Most recent log entries, newest first
#[instrument(skip(pool))]
pub async fn list_activity(pool: &Pool<Sqlite>, limit: i64) -> Result<Vec<ActivityLog>> {
    sqlx::query_as::<_, ActivityLog>(
        r#"
        SELECT id, level, message, created_at
        FROM activity_logs
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list activity")
    .map_err(|e| Error::DatabaseError(e.to_string()))
}

/// Delete every log entry
#[instrument(skip(pool))]
pub async fn clear_activity(pool: &Pool<Sqlite>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM activity_logs")
        .execute(pool)
        .await
        .context("Failed to clear activity")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pool;

    #[tokio::test]
    async fn test_activity_log() {
        let pool = test_pool().await;

        record_activity(&pool, LogLevel::Info, "Job added: Welder").await.unwrap();
        record_activity(&pool, LogLevel::Warning, "Failed login for 'bob'").await.unwrap();

        let entries = list_activity(&pool, 100).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].log_level(), LogLevel::Warning);
        assert!(entries[0].to_line().contains("WARNING Failed login"));

        assert_eq!(clear_activity(&pool).await.unwrap(), 2);
        assert!(list_activity(&pool, 100).await.unwrap().is_empty());
    }
}
