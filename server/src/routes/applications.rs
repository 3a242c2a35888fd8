//! Candidate applications and their CVs

use ams_core::{backup, upload, LogLevel};
use ams_database::{queries, ApplicationWithJob};
use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::io::Cursor;
use tokio_util::io::ReaderStream;
use tracing::{info, instrument, warn};

use super::{ApiError, ApiResult};
use crate::state::AppState;

/// Create applications router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/get-applications", get(list_applications))
        .route("/delete-application/{id}", delete(delete_application))
        .route("/download-cv/{id}", get(download_cv))
        .route("/download-all-cvs", get(download_all_cvs))
        .route("/clear-cv-uploads", post(clear_cv_uploads))
}

fn application_json(app: &ApplicationWithJob) -> Value {
    json!({
        "id": app.id,
        "job_id": app.job_id,
        "name": app.name,
        "phone": app.phone,
        "resume_file": app.resume_file,
        "job_title": app.job_title,
        "company": app.company,
        "applied_at": app.applied_at.format("%Y-%m-%d %H:%M").to_string(),
    })
}

fn attachment(file_name: &str) -> String {
    format!("attachment; filename=\"{}\"", file_name.replace('"', ""))
}

/// Last path segment of a stored relative path
fn base_name(relative: &str) -> &str {
    relative.rsplit('/').next().unwrap_or(relative)
}

#[instrument(skip(state))]
async fn list_applications(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let applications = queries::list_applications(&state.pool)
        .await
        .map_err(ApiError::from_error)?;

    Ok(Json(
        applications.iter().map(application_json).collect::<Vec<_>>(),
    ))
}

/// Delete one application and its CV
#[instrument(skip(state))]
async fn delete_application(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let application = queries::delete_application(&state.pool, id)
        .await
        .map_err(ApiError::from_error)?;

    if let Err(e) = state.uploads.remove(&application.resume_file).await {
        warn!(error = %e, file = %application.resume_file, "Failed to remove CV");
    }

    info!(application_id = id, "Application deleted");
    state
        .activity(
            LogLevel::Warning,
            &format!("Application #{} from {} deleted", id, application.name),
        )
        .await;

    Ok(Json(json!({ "success": true })))
}

/// Stream one CV as an attachment
#[instrument(skip(state))]
async fn download_cv(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let application = queries::get_application(&state.pool, id)
        .await
        .map_err(ApiError::from_error)?;

    let path = state
        .uploads
        .path_of(&application.resume_file)
        .map_err(ApiError::from_error)?;

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        warn!(path = %path.display(), error = %e, "CV file missing");
        ApiError::not_found("CV file")
    })?;

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            attachment(base_name(&application.resume_file)),
        ),
    ];

    Ok((headers, Body::from_stream(ReaderStream::new(file))))
}

/// Every stored CV in one zip archive
#[instrument(skip(state))]
async fn download_all_cvs(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let applications = queries::list_applications(&state.pool)
        .await
        .map_err(ApiError::from_error)?;

    let mut entries = Vec::with_capacity(applications.len());
    for app in &applications {
        match state.uploads.path_of(&app.resume_file) {
            Ok(path) => entries.push((base_name(&app.resume_file).to_string(), path)),
            Err(e) => warn!(error = %e, application_id = app.id, "Skipping CV with invalid path"),
        }
    }

    let archive = tokio::task::spawn_blocking(move || {
        backup::zip_files(&entries, Cursor::new(Vec::new())).map(Cursor::into_inner)
    })
    .await
    .map_err(|e| ApiError::internal_error(format!("Archive task failed: {}", e)))?
    .map_err(ApiError::from_error)?;

    info!(count = applications.len(), size = archive.len(), "Built CV archive");

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (header::CONTENT_DISPOSITION, attachment("all_cvs.zip")),
    ];

    Ok((headers, archive))
}

/// Delete every application and every stored CV
#[instrument(skip(state))]
async fn clear_cv_uploads(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let removed = queries::delete_all_applications(&state.pool)
        .await
        .map_err(ApiError::from_error)?;

    // Also sweeps CVs whose rows are already gone
    let files = state
        .uploads
        .clear(upload::CV_DIR)
        .await
        .map_err(ApiError::from_error)?;

    info!(applications = removed.len(), files, "CV uploads cleared");
    state
        .activity(
            LogLevel::Warning,
            &format!("Cleared {} applications and {} CV files", removed.len(), files),
        )
        .await;

    Ok(Json(json!({
        "success": true,
        "deleted": removed.len(),
        "files": files,
    })))
}
