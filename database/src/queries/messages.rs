//! Contact message queries

use ams_core::{Error, Result};
use anyhow::Context;
use sqlx::{Pool, Sqlite};
use tracing::instrument;

use crate::models::{CreateMessage, Message};

/// List all messages, newest first
#[instrument(skip(pool))]
pub async fn list_messages(pool: &Pool<Sqlite>) -> Result<Vec<Message>> {
    sqlx::query_as::<_, Message>(
        r#"
        SELECT id, name, email, phone, subject, message, created_at
        FROM messages
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list messages")
    .map_err(|e| Error::DatabaseError(e.to_string()))
}

/// Store a contact message
#[instrument(skip(pool, input))]
pub async fn create_message(pool: &Pool<Sqlite>, input: &CreateMessage) -> Result<i64> {
    input.validate().map_err(Error::ValidationError)?;

    let result = sqlx::query(
        r#"
        INSERT INTO messages (name, email, phone, subject, message)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.name.trim())
    .bind(input.email.trim())
    .bind(&input.phone)
    .bind(&input.subject)
    .bind(&input.message)
    .execute(pool)
    .await
    .context("Failed to create message")
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.last_insert_rowid())
}

/// Delete one message
#[instrument(skip(pool))]
pub async fn delete_message(pool: &Pool<Sqlite>, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete message")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Message".to_string()));
    }
    Ok(())
}

/// Delete every message, returning how many were removed
#[instrument(skip(pool))]
pub async fn clear_messages(pool: &Pool<Sqlite>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM messages")
        .execute(pool)
        .await
        .context("Failed to clear messages")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected())
}
