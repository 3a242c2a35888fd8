//! Admin notification queries

use ams_core::{Error, Result};
use anyhow::Context;
use sqlx::{Pool, Sqlite};
use tracing::instrument;

use crate::models::{CreateNotification, Notification};

/// Most recent notifications, newest first
#[instrument(skip(pool))]
pub async fn list_notifications(pool: &Pool<Sqlite>, limit: i64) -> Result<Vec<Notification>> {
    sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, notification_type, title, description, is_read, created_at
        FROM notifications
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list notifications")
    .map_err(|e| Error::DatabaseError(e.to_string()))
}

/// Raise a notification
#[instrument(skip(pool, input), fields(kind = input.kind.as_str()))]
pub async fn create_notification(pool: &Pool<Sqlite>, input: &CreateNotification) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO notifications (notification_type, title, description)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(input.kind.as_str())
    .bind(&input.title)
    .bind(&input.description)
    .execute(pool)
    .await
    .context("Failed to create notification")
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.last_insert_rowid())
}

/// Mark one notification as read
#[instrument(skip(pool))]
pub async fn mark_notification_read(pool: &Pool<Sqlite>, id: i64) -> Result<()> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to mark notification read")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Notification".to_string()));
    }
    Ok(())
}

/// Delete every notification
#[instrument(skip(pool))]
pub async fn clear_notifications(pool: &Pool<Sqlite>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM notifications")
        .execute(pool)
        .await
        .context("Failed to clear notifications")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected())
}

/// Count unread notifications
#[instrument(skip(pool))]
pub async fn count_unread(pool: &Pool<Sqlite>) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE is_read = 0")
        .fetch_one(pool)
        .await
        .context("Failed to count unread notifications")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;
    Ok(count.0)
}
