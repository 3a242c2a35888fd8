//! Contact messages and the portal marquee

use ams_core::LogLevel;
use ams_database::{queries, MARQUEE_KEY, MARQUEE_MAX_CHARS};
use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};

use super::{ApiError, ApiResult, MultipartForm};
use crate::state::AppState;

/// Create admin messages router
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/get-messages", get(list_messages))
        .route("/delete-message/{id}", delete(delete_message))
        .route("/clear-messages", post(clear_messages))
        .route("/update-marquee", post(update_marquee))
}

#[instrument(skip(state))]
async fn list_messages(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let messages = queries::list_messages(&state.pool)
        .await
        .map_err(ApiError::from_error)?;

    let items: Vec<_> = messages
        .iter()
        .map(|m| {
            json!({
                "id": m.id,
                "name": m.name,
                "email": m.email,
                "phone": m.phone,
                "subject": m.subject,
                "message": m.message,
                "created_at": m.created_at.format("%Y-%m-%d %H:%M").to_string(),
            })
        })
        .collect();

    Ok(Json(items))
}

#[instrument(skip(state))]
async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    queries::delete_message(&state.pool, id)
        .await
        .map_err(ApiError::from_error)?;

    info!(message_id = id, "Message deleted");
    Ok(Json(json!({ "success": true })))
}

#[instrument(skip(state))]
async fn clear_messages(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let deleted = queries::clear_messages(&state.pool)
        .await
        .map_err(ApiError::from_error)?;

    info!(deleted, "Messages cleared");
    state
        .activity(LogLevel::Warning, &format!("Cleared {} messages", deleted))
        .await;

    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

/// Replace the scrolling text on the careers page
#[instrument(skip(state, multipart))]
async fn update_marquee(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = MultipartForm::read(multipart).await?;
    // Blank clears the marquee
    let text = form.text("text").unwrap_or_default();

    if text.chars().count() > MARQUEE_MAX_CHARS {
        return Err(ApiError::bad_request(format!(
            "Marquee text must be at most {} characters",
            MARQUEE_MAX_CHARS
        )));
    }

    queries::set_setting(&state.pool, MARQUEE_KEY, text)
        .await
        .map_err(ApiError::from_error)?;

    info!("Marquee updated");
    state.activity(LogLevel::Info, "Marquee text updated").await;

    Ok(Json(json!({ "success": true, "text": text })))
}
