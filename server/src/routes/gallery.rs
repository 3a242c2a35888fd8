//! Portal gallery of images and videos

use ams_core::{upload, LogLevel, MediaType};
use ams_database::{queries, CreateGalleryItem, GalleryItem};
use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{delete, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::{ApiError, ApiResult, MultipartForm};
use crate::state::AppState;

/// Create admin gallery router
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/add-gallery", post(add_gallery))
        .route("/delete-gallery/{id}", delete(delete_gallery))
}

fn gallery_json(item: &GalleryItem) -> Value {
    json!({
        "id": item.id,
        "title": item.title,
        "filename": item.filename(),
        "url": item.url(),
        "media_type": item.media_type,
        "created_at": item.created_at.format("%Y-%m-%d %H:%M").to_string(),
    })
}

/// All gallery items, newest first. Public.
#[instrument(skip(state))]
pub async fn list_gallery(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let items = queries::list_gallery(&state.pool)
        .await
        .map_err(ApiError::from_error)?;

    Ok(Json(items.iter().map(gallery_json).collect::<Vec<_>>()))
}

fn allowed_extensions(media: MediaType) -> &'static [&'static str] {
    match media {
        MediaType::Image => upload::IMAGE_EXTENSIONS,
        MediaType::Video => upload::VIDEO_EXTENSIONS,
    }
}

/// Upload an image or video
#[instrument(skip(state, multipart))]
async fn add_gallery(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = MultipartForm::read(multipart).await?;

    let media_type = form.text("media_type").unwrap_or("image");
    let media = MediaType::from_str(media_type).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Invalid media type '{}', expected image or video",
            media_type
        ))
    })?;

    let file = form
        .file("file")
        .ok_or_else(|| ApiError::bad_request("A file is required"))?;

    let allowed = allowed_extensions(media);
    if !upload::has_allowed_extension(&file.file_name, allowed) {
        return Err(ApiError::bad_request(format!(
            "{} must be one of: {}",
            media.as_str(),
            allowed.join(", ")
        )));
    }

    let stored = state
        .uploads
        .save(media.upload_dir(), &file.file_name, &file.bytes)
        .await
        .map_err(ApiError::from_error)?;

    let input = CreateGalleryItem {
        title: form.optional("title").unwrap_or_default(),
        file_path: stored.relative.clone(),
        media_type: media,
    };

    let id = match queries::create_gallery_item(&state.pool, &input).await {
        Ok(id) => id,
        Err(e) => {
            if let Err(cleanup) = state.uploads.remove(&stored.relative).await {
                warn!(error = %cleanup, "Failed to remove gallery file after failed insert");
            }
            return Err(ApiError::from_error(e));
        }
    };

    info!(item_id = id, file = %stored.relative, size = stored.size, "Gallery item added");
    state
        .activity(
            LogLevel::Info,
            &format!("Gallery {} added: {}", media.as_str(), stored.relative),
        )
        .await;

    Ok(Json(json!({
        "success": true,
        "id": id,
        "url": format!("/static/{}", stored.relative),
    })))
}

/// Delete a gallery item and its file
#[instrument(skip(state))]
async fn delete_gallery(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let item = queries::delete_gallery_item(&state.pool, id)
        .await
        .map_err(ApiError::from_error)?;

    if let Err(e) = state.uploads.remove(&item.file_path).await {
        warn!(error = %e, file = %item.file_path, "Failed to remove gallery file");
    }

    info!(item_id = id, "Gallery item deleted");
    state
        .activity(
            LogLevel::Warning,
            &format!("Gallery item {} deleted", item.file_path),
        )
        .await;

    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_gallery_lifecycle() {
        let app = test_app().await;
        let cookie = app.login().await;

        let response = app
            .send(multipart_request(
                "/add-gallery",
                &[
                    ("title", None, "Office"),
                    ("media_type", None, "image"),
                    ("file", Some("office.png"), "PNG"),
                ],
                Some(&cookie),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let id = body_json(response).await["id"].as_i64().unwrap();

        let list = body_json(app.send(get("/get-gallery", None)).await).await;
        assert_eq!(list[0]["filename"], "office.png");
        assert_eq!(list[0]["url"], "/static/images/office.png");

        // Served from the upload root
        let response = app.send(get("/static/images/office.png", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"PNG");

        let response = app
            .send(request("DELETE", &format!("/delete-gallery/{}", id), Some(&cookie)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!app.state.uploads.root().join("images/office.png").exists());
    }

    #[tokio::test]
    async fn test_add_gallery_checks_type() {
        let app = test_app().await;
        let cookie = app.login().await;

        // A video file posted as an image
        let response = app
            .send(multipart_request(
                "/add-gallery",
                &[
                    ("media_type", None, "image"),
                    ("file", Some("clip.mp4"), "MP4"),
                ],
                Some(&cookie),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .send(multipart_request(
                "/add-gallery",
                &[
                    ("media_type", None, "audio"),
                    ("file", Some("song.mp3"), "ID3"),
                ],
                Some(&cookie),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .send(multipart_request(
                "/add-gallery",
                &[
                    ("media_type", None, "video"),
                    ("file", Some("clip.mp4"), "MP4"),
                ],
                Some(&cookie),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(app.state.uploads.root().join("videos/clip.mp4").exists());
    }
}
