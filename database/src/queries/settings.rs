//! Site setting queries

use ams_core::{Error, Result};
use sqlx::{Pool, Sqlite};
use tracing::instrument;

use crate::map_row_error;
use crate::models::Setting;

/// Get setting by key
#[instrument(skip(pool))]
pub async fn get_setting(pool: &Pool<Sqlite>, key: &str) -> Result<Setting> {
    sqlx::query_as::<_, Setting>("SELECT key, value, updated_at FROM settings WHERE key = ?")
        .bind(key)
        .fetch_one(pool)
        .await
        .map_err(|e| map_row_error(e, "Setting"))
}

/// Get setting value with default
pub async fn get_setting_value_or(pool: &Pool<Sqlite>, key: &str, default: &str) -> Result<String> {
    match get_setting(pool, key).await {
        Ok(setting) => Ok(setting.value),
        Err(Error::NotFound(_)) => Ok(default.to_string()),
        Err(e) => Err(e),
    }
}

/// Set setting (insert or update)
#[instrument(skip(pool, value))]
pub async fn set_setting(pool: &Pool<Sqlite>, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(format!("Failed to set setting: {}", e)))?;

    Ok(())
}
