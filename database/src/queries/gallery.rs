//! Gallery queries

use ams_core::{Error, Result};
use anyhow::Context;
use sqlx::{Pool, Sqlite};
use tracing::instrument;

use crate::map_row_error;
use crate::models::{CreateGalleryItem, GalleryItem};

/// List gallery items, newest first
#[instrument(skip(pool))]
pub async fn list_gallery(pool: &Pool<Sqlite>) -> Result<Vec<GalleryItem>> {
    sqlx::query_as::<_, GalleryItem>(
        r#"
        SELECT id, title, file_path, media_type, created_at
        FROM gallery_items
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list gallery")
    .map_err(|e| Error::DatabaseError(e.to_string()))
}

/// Get gallery item by ID
#[instrument(skip(pool))]
pub async fn get_gallery_item(pool: &Pool<Sqlite>, id: i64) -> Result<GalleryItem> {
    sqlx::query_as::<_, GalleryItem>(
        "SELECT id, title, file_path, media_type, created_at FROM gallery_items WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(|e| map_row_error(e, "Gallery item"))
}

/// Add an uploaded image or video to the gallery
#[instrument(skip(pool, input))]
pub async fn create_gallery_item(pool: &Pool<Sqlite>, input: &CreateGalleryItem) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO gallery_items (title, file_path, media_type)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(input.title.trim())
    .bind(&input.file_path)
    .bind(input.media_type.as_str())
    .execute(pool)
    .await
    .context("Failed to create gallery item")
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.last_insert_rowid())
}

/// Delete a gallery item, returning the removed row so its file can be cleaned up
#[instrument(skip(pool))]
pub async fn delete_gallery_item(pool: &Pool<Sqlite>, id: i64) -> Result<GalleryItem> {
    let item = get_gallery_item(pool, id).await?;

    sqlx::query("DELETE FROM gallery_items WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete gallery item")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(item)
}
