//! Public careers portal

use ams_core::{upload, LogLevel, NotificationKind};
use ams_database::{queries, CreateApplication, CreateMessage, MARQUEE_KEY};
use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::{Form, WithRejection};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use super::{gallery, jobs, ApiError, ApiResult, AppError, FormError, MultipartForm};
use crate::state::AppState;
use crate::templates::{GalleryCard, HomeTemplate, JobCard};

/// Shown when the marquee setting row is missing
pub const DEFAULT_MARQUEE: &str = "Welcome!";

/// Create public router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home_page))
        .route("/health", get(health_check))
        .route("/get-jobs", get(list_open_jobs))
        .route("/apply/{job_id}", post(apply))
        .route("/send-message", post(send_message))
        .route("/get-marquee", get(get_marquee))
        .route("/get-gallery", get(gallery::list_gallery))
}

/// Careers page handler
async fn home_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let today = Local::now().date_naive();

    let jobs = queries::list_live_jobs(&state.pool, today).await?;
    let marquee = queries::get_setting_value_or(&state.pool, MARQUEE_KEY, DEFAULT_MARQUEE).await?;
    let gallery = queries::list_gallery(&state.pool).await?;

    let template = HomeTemplate {
        marquee,
        jobs: jobs.into_iter().map(JobCard::from).collect(),
        gallery: gallery.into_iter().map(GalleryCard::from).collect(),
    };
    Ok(Html(template.render()?))
}

/// Health check endpoint
#[instrument]
async fn health_check() -> impl IntoResponse {
    debug!("Health check requested");
    Json(json!({
        "status": "ok",
        "service": "ams",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Live, unexpired jobs
#[instrument(skip(state))]
async fn list_open_jobs(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let today = Local::now().date_naive();
    let jobs = queries::list_live_jobs(&state.pool, today)
        .await
        .map_err(ApiError::from_error)?;

    Ok(Json(jobs.iter().map(jobs::job_json).collect::<Vec<_>>()))
}

/// Candidate application with CV upload
#[instrument(skip(state, multipart))]
async fn apply(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let job = queries::get_job(&state.pool, job_id)
        .await
        .map_err(ApiError::from_error)?;

    if !job.is_open_on(Local::now().date_naive()) {
        warn!(job_id, "Application for closed job rejected");
        return Err(ApiError::bad_request("This job is no longer accepting applications"));
    }

    let form = MultipartForm::read(multipart).await?;
    let name = form.required("name")?.to_string();
    let phone = form.required("phone")?.to_string();
    let resume = form
        .file("resume")
        .ok_or_else(|| ApiError::bad_request("A CV file is required"))?;

    if !upload::has_allowed_extension(&resume.file_name, upload::CV_EXTENSIONS) {
        return Err(ApiError::bad_request(format!(
            "CV must be one of: {}",
            upload::CV_EXTENSIONS.join(", ")
        )));
    }

    let mut input = CreateApplication {
        job_id,
        name,
        phone,
        resume_file: resume.file_name.clone(),
    };
    input.validate().map_err(ApiError::bad_request)?;

    let stored = state
        .uploads
        .save(upload::CV_DIR, &resume.file_name, &resume.bytes)
        .await
        .map_err(ApiError::from_error)?;
    input.resume_file = stored.relative.clone();

    let id = match queries::create_application(&state.pool, &input).await {
        Ok(id) => id,
        Err(e) => {
            // Do not leave an orphaned CV behind
            if let Err(cleanup) = state.uploads.remove(&stored.relative).await {
                warn!(error = %cleanup, "Failed to remove CV after failed insert");
            }
            return Err(ApiError::from_error(e));
        }
    };

    info!(application_id = id, job_id, "Application received");
    state
        .notify(
            NotificationKind::Application,
            "New application",
            &format!("{} applied for {} at {}", input.name, job.title, job.company),
        )
        .await;
    state
        .activity(
            LogLevel::Info,
            &format!("Application #{} received for job #{}", id, job_id),
        )
        .await;

    Ok(Json(json!({ "status": "success" })))
}

/// Contact form input
#[derive(Debug, Deserialize)]
struct MessageForm {
    name: String,
    email: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    message: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Contact form submission
#[instrument(skip(state, form))]
async fn send_message(
    State(state): State<AppState>,
    WithRejection(Form(form), _): WithRejection<Form<MessageForm>, FormError>,
) -> ApiResult<impl IntoResponse> {
    let input = CreateMessage {
        name: form.name,
        email: form.email,
        phone: non_empty(form.phone),
        subject: non_empty(form.subject),
        message: form.message,
    };

    let id = queries::create_message(&state.pool, &input)
        .await
        .map_err(ApiError::from_error)?;

    info!(message_id = id, "Contact message received");
    let title = input.subject.as_deref().unwrap_or("New message");
    state
        .notify(
            NotificationKind::Message,
            title,
            &format!("From {} <{}>", input.name.trim(), input.email.trim()),
        )
        .await;

    Ok(Json(json!({ "success": true, "id": id })))
}

/// Current marquee text
#[instrument(skip(state))]
async fn get_marquee(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let text = queries::get_setting_value_or(&state.pool, MARQUEE_KEY, DEFAULT_MARQUEE)
        .await
        .map_err(ApiError::from_error)?;

    Ok(Json(json!({ "text": text })))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use ams_core::JobStatus;
    use ams_database::{queries, CreateJob};
    use axum::http::StatusCode;

    async fn seed_job(app: &TestApp) -> i64 {
        queries::create_job(
            &app.state.pool,
            &CreateJob {
                company: "Acme".to_string(),
                title: "Welder".to_string(),
                place: "Dubai".to_string(),
                job_type: "Full time".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;
        let response = app.send(get("/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "ams");
    }

    #[tokio::test]
    async fn test_unknown_page_is_404() {
        let app = test_app().await;
        let response = app.send(get("/no-such-page", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_home_page_lists_live_jobs() {
        let app = test_app().await;
        seed_job(&app).await;

        let response = app.send(get("/", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("Welder"));
        assert!(html.contains("Acme"));
    }

    #[tokio::test]
    async fn test_apply_stores_cv_and_application() {
        let app = test_app().await;
        let job_id = seed_job(&app).await;

        let response = app
            .send(multipart_request(
                &format!("/apply/{}", job_id),
                &[
                    ("name", None, "Jane Doe"),
                    ("phone", None, "+971 50 123 4567"),
                    ("resume", Some("My CV.pdf"), "%PDF-1.4 test"),
                ],
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "success");

        let applications = queries::list_applications(&app.state.pool).await.unwrap();
        assert_eq!(applications.len(), 1);
        assert_eq!(applications[0].resume_file, "cvs/My_CV.pdf");
        assert_eq!(applications[0].job_title.as_deref(), Some("Welder"));
        assert!(app.state.uploads.root().join("cvs/My_CV.pdf").exists());

        assert_eq!(queries::count_unread(&app.state.pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_apply_rejections() {
        let app = test_app().await;
        let job_id = seed_job(&app).await;

        // Unknown job
        let response = app
            .send(multipart_request(
                "/apply/999",
                &[("name", None, "Jane"), ("phone", None, "0501234567")],
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Missing CV
        let response = app
            .send(multipart_request(
                &format!("/apply/{}", job_id),
                &[("name", None, "Jane"), ("phone", None, "0501234567")],
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Disallowed extension
        let response = app
            .send(multipart_request(
                &format!("/apply/{}", job_id),
                &[
                    ("name", None, "Jane"),
                    ("phone", None, "0501234567"),
                    ("resume", Some("cv.exe"), "MZ"),
                ],
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Closed job
        queries::update_job_status(&app.state.pool, job_id, JobStatus::Closed)
            .await
            .unwrap();
        let response = app
            .send(multipart_request(
                &format!("/apply/{}", job_id),
                &[
                    ("name", None, "Jane"),
                    ("phone", None, "0501234567"),
                    ("resume", Some("cv.pdf"), "%PDF"),
                ],
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");

        assert!(queries::list_applications(&app.state.pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_message_and_marquee() {
        let app = test_app().await;

        let response = app
            .send(form_request(
                "/send-message",
                "name=Ali&email=ali%40example.com&subject=Visa&message=Hello",
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], true);
        assert_eq!(queries::list_messages(&app.state.pool).await.unwrap().len(), 1);

        let response = app
            .send(form_request(
                "/send-message",
                "name=Ali&email=nope&message=Hello",
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.send(get("/get-marquee", None)).await;
        assert!(!body_json(response).await["text"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_form_gets_json_error() {
        let app = test_app().await;

        let response = app
            .send(form_request(
                "/send-message",
                "name=Ali&email=ali%40example.com",
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert!(queries::list_messages(&app.state.pool).await.unwrap().is_empty());
    }
}
