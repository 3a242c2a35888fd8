//! Admin activity log

use ams_database::queries;
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};

use super::{ApiError, ApiResult};
use crate::state::AppState;

/// Entries shown in the log panel
const PANEL_LIMIT: i64 = 200;

/// Create activity log router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/get-logs", get(list_logs))
        .route("/clear-logs", post(clear_logs))
        .route("/download-logs", get(download_logs))
}

#[instrument(skip(state))]
async fn list_logs(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let entries = queries::list_activity(&state.pool, PANEL_LIMIT)
        .await
        .map_err(ApiError::from_error)?;

    let items: Vec<_> = entries
        .iter()
        .map(|entry| {
            json!({
                "time": entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                "level": entry.log_level().as_str(),
                "message": entry.message,
            })
        })
        .collect();

    Ok(Json(items))
}

#[instrument(skip(state))]
async fn clear_logs(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let deleted = queries::clear_activity(&state.pool)
        .await
        .map_err(ApiError::from_error)?;

    info!(deleted, "Activity log cleared");
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

/// Whole log as a text file, oldest entry first
#[instrument(skip(state))]
async fn download_logs(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let entries = queries::list_activity(&state.pool, i64::MAX)
        .await
        .map_err(ApiError::from_error)?;

    let mut body = String::new();
    for entry in entries.iter().rev() {
        body.push_str(&entry.to_line());
        body.push('\n');
    }

    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"activity_logs.txt\"",
        ),
    ];

    Ok((headers, body))
}
