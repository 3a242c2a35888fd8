//! Job posting management

use ams_core::{upload, JobStatus, LogLevel, NotificationKind};
use ams_database::{queries, CreateJob, Job};
use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use axum_extra::extract::{Form, WithRejection};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::{ApiError, ApiResult, FormError, MultipartForm};
use crate::state::AppState;

/// Create admin job router
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/add-job", post(add_job))
        .route("/get-jobs-admin", get(list_all_jobs))
        .route("/update-job-status/{id}", post(update_job_status))
        .route("/delete-job/{id}", delete(delete_job))
}

/// JSON shape shared by the public and admin job lists.
///
/// `positions` carries the job title, matching the field name the
/// posting form submits.
pub fn job_json(job: &Job) -> Value {
    json!({
        "id": job.id,
        "company": job.company,
        "positions": job.title,
        "place": job.place,
        "job_type": job.job_type,
        "dept": job.department,
        "worktime": job.work_time,
        "description": job.description,
        "demand_url": job.demand_file.as_ref().map(|f| format!("/static/{}", f)),
        "status": job.status().as_str(),
        "expiry": job.expiry_date.map(|d| d.format("%Y-%m-%d").to_string()),
        "created_at": job.created_at.format("%Y-%m-%d %H:%M").to_string(),
    })
}

fn parse_expiry(value: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|_| ApiError::bad_request(format!("Invalid expiry date '{}', expected YYYY-MM-DD", v)))
        })
        .transpose()
}

/// Create a job posting, with an optional demand letter
#[instrument(skip(state, multipart))]
async fn add_job(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = MultipartForm::read(multipart).await?;

    let mut input = CreateJob {
        company: form.required("companyName")?.to_string(),
        title: form.required("positions")?.to_string(),
        place: form.optional("place").unwrap_or_default(),
        job_type: form.optional("jobType").unwrap_or_default(),
        department: form.optional("dept"),
        work_time: form.optional("worktime"),
        description: form.optional("description"),
        demand_file: None,
        expiry_date: parse_expiry(form.text("expiry"))?,
    };
    input.validate().map_err(ApiError::bad_request)?;

    if let Some(demand) = form.file("demand") {
        if !upload::has_allowed_extension(&demand.file_name, upload::DEMAND_EXTENSIONS) {
            return Err(ApiError::bad_request(format!(
                "Demand letter must be one of: {}",
                upload::DEMAND_EXTENSIONS.join(", ")
            )));
        }
        let stored = state
            .uploads
            .save(upload::DEMAND_DIR, &demand.file_name, &demand.bytes)
            .await
            .map_err(ApiError::from_error)?;
        input.demand_file = Some(stored.relative);
    }

    let id = match queries::create_job(&state.pool, &input).await {
        Ok(id) => id,
        Err(e) => {
            if let Some(ref file) = input.demand_file {
                if let Err(cleanup) = state.uploads.remove(file).await {
                    warn!(error = %cleanup, "Failed to remove demand letter after failed insert");
                }
            }
            return Err(ApiError::from_error(e));
        }
    };

    info!(job_id = id, company = %input.company, "Job created");
    state
        .notify(
            NotificationKind::Job,
            "Job posted",
            &format!("{} at {}", input.title, input.company),
        )
        .await;
    state
        .activity(
            LogLevel::Info,
            &format!("Job #{} added: {} at {}", id, input.title, input.company),
        )
        .await;

    Ok(Json(json!({ "success": true, "id": id })))
}

/// All jobs regardless of status
#[instrument(skip(state))]
async fn list_all_jobs(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let jobs = queries::list_jobs(&state.pool)
        .await
        .map_err(ApiError::from_error)?;

    Ok(Json(jobs.iter().map(job_json).collect::<Vec<_>>()))
}

#[derive(Debug, Deserialize)]
struct StatusForm {
    status: String,
}

/// Open or close a job posting
#[instrument(skip(state))]
async fn update_job_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    WithRejection(Form(form), _): WithRejection<Form<StatusForm>, FormError>,
) -> ApiResult<impl IntoResponse> {
    let status = JobStatus::from_str(form.status.trim()).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Invalid status '{}', expected Live or Closed",
            form.status
        ))
    })?;

    queries::update_job_status(&state.pool, id, status)
        .await
        .map_err(ApiError::from_error)?;

    info!(job_id = id, status = status.as_str(), "Job status updated");
    state
        .activity(
            LogLevel::Info,
            &format!("Job #{} marked {}", id, status.as_str()),
        )
        .await;

    Ok(Json(json!({ "success": true, "status": status.as_str() })))
}

/// Delete a job posting and its demand letter. Applications are kept.
#[instrument(skip(state))]
async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let job = queries::delete_job(&state.pool, id)
        .await
        .map_err(ApiError::from_error)?;

    if let Some(ref file) = job.demand_file {
        if let Err(e) = state.uploads.remove(file).await {
            warn!(error = %e, file = %file, "Failed to remove demand letter");
        }
    }

    info!(job_id = id, "Job deleted");
    state
        .activity(
            LogLevel::Warning,
            &format!("Job #{} deleted: {} at {}", id, job.title, job.company),
        )
        .await;

    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use ams_database::queries;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_admin_routes_require_login() {
        let app = test_app().await;

        let response = app.send(get("/get-jobs-admin", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "UNAUTHORIZED");

        let response = app.send(request("DELETE", "/delete-job/1", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_job_lifecycle() {
        let app = test_app().await;
        let cookie = app.login().await;

        let response = app
            .send(multipart_request(
                "/add-job",
                &[
                    ("companyName", None, "Acme"),
                    ("positions", None, "Welder"),
                    ("place", None, "Doha"),
                    ("jobType", None, "Contract"),
                    ("expiry", None, "2999-12-31"),
                    ("demand", Some("demand letter.pdf"), "%PDF"),
                ],
                Some(&cookie),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        let id = body["id"].as_i64().unwrap();

        let demand = app.state.uploads.root().join("demands/demand_letter.pdf");
        assert!(demand.exists());

        let response = app.send(get("/get-jobs-admin", Some(&cookie))).await;
        let jobs = body_json(response).await;
        assert_eq!(jobs[0]["positions"], "Welder");
        assert_eq!(jobs[0]["status"], "Live");
        assert_eq!(jobs[0]["expiry"], "2999-12-31");

        // Closing hides it from the public list
        let response = app
            .send(form_request(
                &format!("/update-job-status/{}", id),
                "status=Closed",
                Some(&cookie),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let public = body_json(app.send(get("/get-jobs", None)).await).await;
        assert_eq!(public.as_array().unwrap().len(), 0);

        let response = app
            .send(request("DELETE", &format!("/delete-job/{}", id), Some(&cookie)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!demand.exists());
        assert!(queries::list_jobs(&app.state.pool).await.unwrap().is_empty());

        let response = app
            .send(request("DELETE", &format!("/delete-job/{}", id), Some(&cookie)))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_add_job_validation() {
        let app = test_app().await;
        let cookie = app.login().await;

        let response = app
            .send(multipart_request(
                "/add-job",
                &[("companyName", None, "Acme")],
                Some(&cookie),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .send(multipart_request(
                "/add-job",
                &[
                    ("companyName", None, "Acme"),
                    ("positions", None, "Welder"),
                    ("expiry", None, "31/12/2030"),
                ],
                Some(&cookie),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .send(form_request("/update-job-status/1", "status=Paused", Some(&cookie)))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .send(form_request("/update-job-status/42", "status=Live", Some(&cookie)))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
