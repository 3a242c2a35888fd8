//! Staff records and console accounts

use ams_core::{upload, LogLevel, NotificationKind};
use ams_database::{queries, CreateStaff, Staff};
use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::{ApiError, ApiResult, MultipartForm};
use crate::auth::{self, SessionUser, MIN_PASSWORD_LEN};
use crate::state::AppState;

/// Create staff router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/get-staff", get(list_staff))
        .route("/add-staff", post(add_staff))
        .route("/toggle-staff-status/{id}", post(toggle_status))
        .route("/toggle-staff-login/{id}", post(toggle_login))
        .route("/delete-staff/{id}", get(delete_staff))
        .route("/export-staff", get(export_staff))
}

fn staff_json(staff: &Staff) -> Value {
    json!({
        "id": staff.id,
        "name": staff.name,
        "father_name": staff.father_name,
        "mother_name": staff.mother_name,
        "dob": staff.dob,
        "gender": staff.gender,
        "phone": staff.phone,
        "alt_phone": staff.alt_phone,
        "email": staff.email,
        "marital_status": staff.marital_status,
        "blood_group": staff.blood_group,
        "address": staff.address,
        "role": staff.role,
        "userid": staff.userid,
        "photo_url": staff.photo.as_ref().map(|p| format!("/static/{}", p)),
        "status": staff.status().as_str(),
        "login_access": staff.login_enabled,
        "created_at": staff.created_at.format("%Y-%m-%d").to_string(),
    })
}

#[instrument(skip(state))]
async fn list_staff(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let staff = queries::list_staff(&state.pool)
        .await
        .map_err(ApiError::from_error)?;

    Ok(Json(staff.iter().map(staff_json).collect::<Vec<_>>()))
}

/// Register a staff member with an optional photo
#[instrument(skip(state, multipart))]
async fn add_staff(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = MultipartForm::read(multipart).await?;

    let password = form.required("password")?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let mut input = CreateStaff {
        name: form.required("name")?.to_string(),
        father_name: form.optional("father_name"),
        mother_name: form.optional("mother_name"),
        dob: form.optional("dob"),
        gender: form.optional("gender"),
        phone: form.optional("phone"),
        alt_phone: form.optional("alt_phone"),
        email: form.optional("email"),
        marital_status: form.optional("marital_status"),
        blood_group: form.optional("blood_group"),
        address: form.optional("address"),
        role: form.optional("role").unwrap_or_else(|| "staff".to_string()),
        userid: form.required("userid")?.to_string(),
        password_hash: auth::hash_password(password).map_err(ApiError::from_error)?,
        photo: None,
        login_enabled: true,
    };
    input.validate().map_err(ApiError::bad_request)?;

    if let Some(photo) = form.file("photo") {
        if !upload::has_allowed_extension(&photo.file_name, upload::IMAGE_EXTENSIONS) {
            return Err(ApiError::bad_request(format!(
                "Photo must be one of: {}",
                upload::IMAGE_EXTENSIONS.join(", ")
            )));
        }
        let stored = state
            .uploads
            .save(upload::PHOTO_DIR, &photo.file_name, &photo.bytes)
            .await
            .map_err(ApiError::from_error)?;
        input.photo = Some(stored.relative);
    }

    let id = match queries::create_staff(&state.pool, &input).await {
        Ok(id) => id,
        Err(e) => {
            if let Some(ref photo) = input.photo {
                if let Err(cleanup) = state.uploads.remove(photo).await {
                    warn!(error = %cleanup, "Failed to remove photo after failed insert");
                }
            }
            return Err(ApiError::from_error(e));
        }
    };

    info!(staff_id = id, userid = %input.userid, "Staff member added");
    state
        .notify(
            NotificationKind::Staff,
            "Staff added",
            &format!("{} ({})", input.name, input.role),
        )
        .await;
    state
        .activity(
            LogLevel::Info,
            &format!("Staff #{} added: {} as {}", id, input.name, input.userid),
        )
        .await;

    Ok(Json(json!({ "success": true, "id": id })))
}

/// Flip between Active and Inactive
#[instrument(skip(state))]
async fn toggle_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let staff = queries::get_staff(&state.pool, id)
        .await
        .map_err(ApiError::from_error)?;
    let status = staff.status().toggled();

    queries::set_staff_status(&state.pool, id, status)
        .await
        .map_err(ApiError::from_error)?;

    info!(staff_id = id, status = status.as_str(), "Staff status changed");
    state
        .activity(
            LogLevel::Info,
            &format!("Staff {} is now {}", staff.userid, status.as_str()),
        )
        .await;

    Ok(Json(json!({ "success": true, "status": status.as_str() })))
}

/// Grant or revoke console access
#[instrument(skip(state))]
async fn toggle_login(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let staff = queries::get_staff(&state.pool, id)
        .await
        .map_err(ApiError::from_error)?;
    let enabled = !staff.login_enabled;

    queries::set_staff_login(&state.pool, id, enabled)
        .await
        .map_err(ApiError::from_error)?;

    info!(staff_id = id, enabled, "Staff login access changed");
    state
        .activity(
            LogLevel::Info,
            &format!(
                "Login {} for {}",
                if enabled { "enabled" } else { "disabled" },
                staff.userid
            ),
        )
        .await;

    Ok(Json(json!({ "success": true, "login_access": enabled })))
}

/// Delete a staff member and their photo, then return to the dashboard.
/// The signed-in account cannot delete itself.
#[instrument(skip(state, user), fields(by = %user.userid))]
async fn delete_staff(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if user.id == id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    let staff = queries::delete_staff(&state.pool, id)
        .await
        .map_err(ApiError::from_error)?;

    if let Some(ref photo) = staff.photo {
        if let Err(e) = state.uploads.remove(photo).await {
            warn!(error = %e, file = %photo, "Failed to remove staff photo");
        }
    }

    info!(staff_id = id, "Staff member deleted");
    state
        .activity(
            LogLevel::Warning,
            &format!("Staff #{} ({}) deleted by {}", id, staff.userid, user.userid),
        )
        .await;

    Ok(Redirect::to("/admin"))
}

const CSV_HEADER: &[&str] = &[
    "ID",
    "Name",
    "Father's Name",
    "Mother's Name",
    "DOB",
    "Gender",
    "Phone",
    "Alt Phone",
    "Email",
    "Marital Status",
    "Blood Group",
    "Address",
    "Role",
    "User ID",
    "Status",
    "Login Access",
];

/// Quote a CSV field when it contains a delimiter, quote or line break.
///
/// Cells a spreadsheet would evaluate as a formula get a leading `'`.
fn csv_field(value: &str) -> String {
    let value = if value.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        format!("'{}", value)
    } else {
        value.to_string()
    };

    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}

fn csv_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut row = fields
        .iter()
        .map(|f| csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}

fn staff_csv(staff: &[Staff]) -> String {
    let mut out = csv_row(CSV_HEADER);
    for s in staff {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        out.push_str(&csv_row(&[
            s.id.to_string(),
            s.name.clone(),
            opt(&s.father_name),
            opt(&s.mother_name),
            opt(&s.dob),
            opt(&s.gender),
            opt(&s.phone),
            opt(&s.alt_phone),
            opt(&s.email),
            opt(&s.marital_status),
            opt(&s.blood_group),
            opt(&s.address),
            s.role.clone(),
            s.userid.clone(),
            s.status().as_str().to_string(),
            if s.login_enabled { "Yes" } else { "No" }.to_string(),
        ]));
    }
    out
}

/// All staff as a CSV attachment
#[instrument(skip(state))]
async fn export_staff(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let staff = queries::list_staff(&state.pool)
        .await
        .map_err(ApiError::from_error)?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"staff_export.csv\"",
        ),
    ];

    Ok((headers, staff_csv(&staff)))
}

#[cfg(test)]
mod tests {
    use super::csv_field;
    use crate::routes::test_support::*;
    use ams_core::StaffStatus;
    use ams_database::queries;
    use axum::http::{header, StatusCode};

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("Dubai, UAE"), "\"Dubai, UAE\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("=HYPERLINK(\"x\")"), "\"'=HYPERLINK(\"\"x\"\")\"");
        assert_eq!(csv_field("+971501234567"), "'+971501234567");
        assert_eq!(csv_field("@SUM(A1)"), "'@SUM(A1)");
        assert_eq!(csv_field("-1"), "'-1");
    }

    async fn add(app: &TestApp, cookie: &str, userid: &str, password: &str) -> axum::response::Response {
        app.send(multipart_request(
            "/add-staff",
            &[
                ("name", None, "Sara Khan"),
                ("userid", None, userid),
                ("password", None, password),
                ("address", None, "Street 1, Dubai"),
                ("photo", Some("sara.png"), "PNG"),
            ],
            Some(cookie),
        ))
        .await
    }

    #[tokio::test]
    async fn test_add_and_list_staff() {
        let app = test_app().await;
        let cookie = app.login().await;

        let response = add(&app, &cookie, "sara", "secret1").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(app.state.uploads.root().join("photos/sara.png").exists());

        let list = body_json(app.send(get("/get-staff", Some(&cookie))).await).await;
        let sara = list
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["userid"] == "sara")
            .unwrap()
            .clone();
        assert_eq!(sara["status"], "Active");
        assert_eq!(sara["login_access"], true);
        assert_eq!(sara["photo_url"], "/static/photos/sara.png");
        assert!(sara.get("password_hash").is_none());

        // Duplicate user id
        let response = add(&app, &cookie, "sara", "secret1").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Short password
        let response = add(&app, &cookie, "omar", "123").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_toggles_and_delete() {
        let app = test_app().await;
        let cookie = app.login().await;
        let body = body_json(add(&app, &cookie, "sara", "secret1").await).await;
        let id = body["id"].as_i64().unwrap();

        let response = app
            .send(request("POST", &format!("/toggle-staff-status/{}", id), Some(&cookie)))
            .await;
        assert_eq!(body_json(response).await["status"], "Inactive");

        let response = app
            .send(request("POST", &format!("/toggle-staff-login/{}", id), Some(&cookie)))
            .await;
        assert_eq!(body_json(response).await["login_access"], false);

        let staff = queries::get_staff(&app.state.pool, id).await.unwrap();
        assert!(!staff.can_login());

        let response = app
            .send(get(&format!("/delete-staff/{}", id), Some(&cookie)))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/admin");
        assert!(!app.state.uploads.root().join("photos/sara.png").exists());

        let response = app
            .send(request("POST", &format!("/toggle-staff-status/{}", id), Some(&cookie)))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_revoked_account_loses_session() {
        let app = test_app().await;
        let cookie = app.login().await;
        let admin = queries::get_staff_by_userid(&app.state.pool, ADMIN_USER)
            .await
            .unwrap();

        queries::set_staff_login(&app.state.pool, admin.id, false)
            .await
            .unwrap();
        let response = app.send(get("/get-staff", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["success"], false);

        // The session was dropped, so restoring access needs a fresh login
        queries::set_staff_login(&app.state.pool, admin.id, true)
            .await
            .unwrap();
        let response = app.send(get("/export-staff", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let cookie = app.login().await;
        queries::set_staff_status(&app.state.pool, admin.id, StaffStatus::Inactive)
            .await
            .unwrap();
        let response = app.send(get("/admin", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_deleted_account_loses_session() {
        let app = test_app().await;
        let cookie = app.login().await;
        let admin = queries::get_staff_by_userid(&app.state.pool, ADMIN_USER)
            .await
            .unwrap();

        queries::delete_staff(&app.state.pool, admin.id).await.unwrap();
        let response = app.send(get("/get-staff", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cannot_delete_self() {
        let app = test_app().await;
        let cookie = app.login().await;
        let admin = queries::get_staff_by_userid(&app.state.pool, ADMIN_USER)
            .await
            .unwrap();

        let response = app
            .send(get(&format!("/delete-staff/{}", admin.id), Some(&cookie)))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_staff_csv() {
        let app = test_app().await;
        let cookie = app.login().await;
        add(&app, &cookie, "sara", "secret1").await;

        let response = app.send(get("/export-staff", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"staff_export.csv\""
        );

        let csv = String::from_utf8(body_bytes(response).await).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[0].starts_with("ID,Name,"));
        assert_eq!(lines.len(), 3);
        assert!(csv.contains("\"Street 1, Dubai\""));
    }
}
