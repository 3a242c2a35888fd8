//! HTTP routes
//!
//! ```text
//! public     /  /get-jobs  /apply/{id}  /send-message  /get-marquee  /get-gallery  /health
//! auth       /login  /logout
//! admin      /admin  /dashboard-stats  jobs  applications  staff  messages  marquee
//!            notifications  logs  gallery  backup  /change-password
//! static     /static/{demands,photos,images,videos}/**
//! ```

mod applications;
mod auth;
mod backup;
mod dashboard;
mod gallery;
mod jobs;
mod logs;
mod messages;
mod multipart;
mod notifications;
mod public;
mod staff;

use ams_core::{upload, Error};
use askama::Template;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    Json, Router,
};
use axum_extra::extract::FormRejection;
use serde::Serialize;
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::{error, warn};

use crate::state::AppState;
use crate::templates::NotFoundTemplate;

pub use multipart::MultipartForm;

/// Build the complete application router
pub fn app<Store>(state: AppState, sessions: SessionManagerLayer<Store>) -> Router
where
    Store: SessionStore + Clone,
{
    let body_limit = state.config.max_upload_bytes();
    let upload_root = state.uploads.root().to_path_buf();

    let admin = Router::new()
        .merge(dashboard::routes())
        .merge(jobs::admin_routes())
        .merge(applications::routes())
        .merge(staff::routes())
        .merge(messages::admin_routes())
        .merge(notifications::routes())
        .merge(logs::routes())
        .merge(gallery::admin_routes())
        .merge(backup::routes())
        .merge(auth::admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_admin,
        ));

    let mut router = Router::new()
        .merge(public::routes())
        .merge(auth::routes())
        .merge(admin);

    // Public uploads only; CVs go through the admin download routes
    for dir in upload::PUBLIC_DIRS {
        router = router.nest_service(
            &format!("/static/{}", dir),
            ServeDir::new(upload_root.join(dir)),
        );
    }

    router
        .fallback(not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(sessions)
        .with_state(state)
}

/// 404 handler
async fn not_found() -> Result<Response, AppError> {
    let template = NotFoundTemplate {};
    Ok((StatusCode::NOT_FOUND, Html(template.render()?)).into_response())
}

// ============================================================================
// JSON errors
// ============================================================================

/// Standard API error response.
///
/// `message` repeats `error.message` at the top level, which is where the
/// admin console script reads it from.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub message: String,
    pub error: ApiErrorDetails,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorDetails {
    pub code: String,
    pub message: String,
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

impl ApiError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            message: message.clone(),
            error: ApiErrorDetails {
                code: code.to_string(),
                message,
            },
        }
    }

    pub fn not_found(resource: &str) -> (StatusCode, Json<Self>) {
        (
            StatusCode::NOT_FOUND,
            Json(Self::new("NOT_FOUND", format!("{} not found", resource))),
        )
    }

    pub fn bad_request(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::BAD_REQUEST,
            Json(Self::new("BAD_REQUEST", message)),
        )
    }

    pub fn unauthorized(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::UNAUTHORIZED,
            Json(Self::new("UNAUTHORIZED", message)),
        )
    }

    pub fn internal_error(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Self::new("INTERNAL_ERROR", message)),
        )
    }

    pub fn conflict(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (StatusCode::CONFLICT, Json(Self::new("CONFLICT", message)))
    }

    /// Map a core error onto a status code; server faults are logged
    pub fn from_error(err: Error) -> (StatusCode, Json<Self>) {
        match err {
            Error::NotFound(resource) => Self::not_found(&resource),
            Error::ValidationError(msg) | Error::UploadError(msg) => {
                warn!(error = %msg, "Rejected request");
                Self::bad_request(msg)
            }
            Error::AuthError(msg) => Self::unauthorized(msg),
            other => {
                error!(error = %other, "Request failed");
                Self::internal_error(other.to_string())
            }
        }
    }
}

/// Rejection for form bodies that fail to parse, answered with the
/// standard JSON error
#[derive(Debug)]
pub struct FormError(String);

impl From<FormRejection> for FormError {
    fn from(rejection: FormRejection) -> Self {
        Self(rejection.body_text())
    }
}

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "Rejected form body");
        ApiError::bad_request(self.0).into_response()
    }
}

// ============================================================================
// HTML errors
// ============================================================================

/// Error type for page handlers
#[derive(Debug)]
pub enum AppError {
    DatabaseError(String),
    TemplateError(String),
    NotFound(String),
    ValidationError(String),
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::DatabaseError(msg) => {
                error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {}", msg))
            }
            AppError::TemplateError(msg) => {
                error!("Template error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Template error: {}", msg))
            }
            AppError::NotFound(msg) => {
                warn!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, msg.clone())
            }
            AppError::ValidationError(msg) => {
                warn!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::InternalError(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal error: {}", msg))
            }
        };

        (status, message).into_response()
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::TemplateError(err.to_string())
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::DatabaseError(msg) => AppError::DatabaseError(msg),
            Error::NotFound(resource) => AppError::NotFound(format!("{} not found", resource)),
            Error::ValidationError(msg) => AppError::ValidationError(msg),
            other => AppError::InternalError(other.to_string()),
        }
    }
}
