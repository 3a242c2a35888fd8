//! Admin activity panel notifications

use ams_database::queries;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};

use super::{ApiError, ApiResult};
use crate::state::AppState;

/// Most recent notifications shown in the panel
const PANEL_LIMIT: i64 = 50;

/// Create notifications router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/get-notifications", get(list_notifications))
        .route("/mark-notification-read/{id}", post(mark_read))
        .route("/clear-notifications", post(clear_notifications))
}

#[instrument(skip(state))]
async fn list_notifications(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let notifications = queries::list_notifications(&state.pool, PANEL_LIMIT)
        .await
        .map_err(ApiError::from_error)?;

    let items: Vec<_> = notifications
        .iter()
        .map(|n| {
            json!({
                "id": n.id,
                "notification_type": n.kind().as_str(),
                "icon": n.icon(),
                "title": n.title,
                "description": n.description,
                "is_read": n.is_read,
                "created_at": n.created_at.format("%Y-%m-%d %H:%M").to_string(),
            })
        })
        .collect();

    Ok(Json(items))
}

/// Mark one notification read. The row is kept.
#[instrument(skip(state))]
async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    queries::mark_notification_read(&state.pool, id)
        .await
        .map_err(ApiError::from_error)?;

    Ok(Json(json!({ "success": true })))
}

#[instrument(skip(state))]
async fn clear_notifications(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let deleted = queries::clear_notifications(&state.pool)
        .await
        .map_err(ApiError::from_error)?;

    info!(deleted, "Notifications cleared");
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}
