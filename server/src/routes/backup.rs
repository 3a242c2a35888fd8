//! Website backup control

use ams_core::{backup, BackupJob, BackupOutcome, LogLevel, NotificationKind};
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::task::JoinError;
use tokio_util::io::ReaderStream;
use tracing::{error, info, instrument};

use super::{ApiError, ApiResult};
use crate::state::AppState;

/// Create backup router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/start-backup", post(start_backup))
        .route("/backup-progress", get(backup_progress))
        .route("/cancel-backup", post(cancel_backup))
        .route("/download-backup", get(download_backup))
}

/// Start a backup in the background; 409 while one is running
#[instrument(skip(state))]
async fn start_backup(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    if state.backup.try_begin().is_err() {
        return Err(ApiError::conflict("A backup is already running"));
    }

    let cfg = &state.config.backup;
    let job = BackupJob::new(cfg.source_dir.clone(), cfg.output_dir.clone())
        .with_exclude(cfg.exclude.clone());

    info!(source = %cfg.source_dir.display(), "Backup started");
    state.activity(LogLevel::Info, "Website backup started").await;

    let task_state = state.clone();
    tokio::spawn(async move {
        let tracker = task_state.backup.clone();
        let result = tokio::task::spawn_blocking(move || job.run(&tracker)).await;
        record_outcome(&task_state, result).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "success": true, "message": "Backup started" })),
    ))
}

/// Report a finished backup. A worker that died without reporting back
/// still releases the tracker.
async fn record_outcome(state: &AppState, result: Result<ams_core::Result<BackupOutcome>, JoinError>) {
    match result {
        Ok(Ok(BackupOutcome::Completed { archive, files })) => {
            let name = archive
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            state
                .notify(
                    NotificationKind::Backup,
                    "Backup completed",
                    &format!("{} files archived to {}", files, name),
                )
                .await;
            state
                .activity(LogLevel::Info, &format!("Backup completed: {}", name))
                .await;
        }
        Ok(Ok(BackupOutcome::Cancelled)) => {
            state
                .activity(LogLevel::Warning, "Website backup cancelled")
                .await;
        }
        Ok(Err(e)) => {
            state
                .notify(NotificationKind::Backup, "Backup failed", &e.to_string())
                .await;
            state
                .activity(LogLevel::Error, &format!("Backup failed: {}", e))
                .await;
        }
        Err(e) => {
            error!(error = %e, "Backup task panicked");
            state.backup.fail("backup worker stopped unexpectedly");
            state
                .notify(
                    NotificationKind::Backup,
                    "Backup failed",
                    "The backup worker stopped unexpectedly",
                )
                .await;
            state
                .activity(LogLevel::Error, &format!("Backup worker stopped: {}", e))
                .await;
        }
    }
}

#[instrument(skip(state))]
async fn backup_progress(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.backup.snapshot())
}

#[instrument(skip(state))]
async fn cancel_backup(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    if !state.backup.cancel() {
        return Err(ApiError::bad_request("No backup is running"));
    }

    info!("Backup cancellation requested");
    Ok(Json(json!({ "success": true, "message": "Cancellation requested" })))
}

/// Stream the newest archive
#[instrument(skip(state))]
async fn download_backup(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let output_dir = state.config.backup.output_dir.clone();
    let latest = backup::latest_archive(&output_dir)
        .map_err(ApiError::from_error)?
        .ok_or_else(|| ApiError::not_found("Backup archive"))?;

    let file = tokio::fs::File::open(&latest)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to open archive: {}", e)))?;

    let name = latest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "backup.zip".to_string());

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name),
        ),
    ];

    Ok((headers, Body::from_stream(ReaderStream::new(file))))
}
