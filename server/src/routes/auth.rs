//! Login, logout and password change

use ams_core::{Error, LogLevel};
use ams_database::queries;
use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::{Form, WithRejection};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use super::{ApiError, ApiResult, AppError, FormError};
use crate::auth::{self, SessionUser, MIN_PASSWORD_LEN, USER_KEY};
use crate::state::AppState;
use crate::templates::LoginTemplate;

/// Create public auth router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

/// Create auth routes that need a signed-in user
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/change-password", post(change_password))
}

fn session_error(e: tower_sessions::session::Error) -> AppError {
    AppError::InternalError(format!("Session error: {}", e))
}

/// Login page; signed-in users go straight to the dashboard
async fn login_page(session: Session) -> Result<Response, AppError> {
    if session
        .get::<SessionUser>(USER_KEY)
        .await
        .map_err(session_error)?
        .is_some()
    {
        return Ok(Redirect::to("/admin").into_response());
    }

    let template = LoginTemplate {
        error: None,
        userid: String::new(),
    };
    Ok(Html(template.render()?).into_response())
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    userid: String,
    password: String,
}

#[instrument(skip(state, session, form), fields(userid = %form.userid))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    WithRejection(Form(form), _): WithRejection<Form<LoginForm>, FormError>,
) -> Result<Response, AppError> {
    let userid = form.userid.trim();

    match auth::authenticate(&state.pool, userid, &form.password).await {
        Ok(user) => {
            // New id on privilege change
            session.cycle_id().await.map_err(session_error)?;
            session
                .insert(USER_KEY, user.clone())
                .await
                .map_err(session_error)?;

            info!(userid = %user.userid, "User logged in");
            state
                .activity(LogLevel::Info, &format!("{} logged in", user.userid))
                .await;
            Ok(Redirect::to("/admin").into_response())
        }
        Err(Error::AuthError(message)) => {
            warn!(userid, "Failed login attempt");
            state
                .activity(
                    LogLevel::Warning,
                    &format!("Failed login attempt for '{}'", userid),
                )
                .await;

            let template = LoginTemplate {
                error: Some(message),
                userid: userid.to_string(),
            };
            Ok((StatusCode::UNAUTHORIZED, Html(template.render()?)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn logout(session: Session) -> Result<Redirect, AppError> {
    if let Some(user) = session
        .get::<SessionUser>(USER_KEY)
        .await
        .map_err(session_error)?
    {
        info!(userid = %user.userid, "User logged out");
    }
    session.flush().await.map_err(session_error)?;
    Ok(Redirect::to("/login"))
}

#[derive(Debug, Deserialize)]
struct ChangePasswordForm {
    current: String,
    new: String,
}

/// Change the signed-in user's password.
///
/// Answers `{"status":"success"}` or `{"status":"error","message":..}`.
#[instrument(skip(state, user, form), fields(userid = %user.userid))]
async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    WithRejection(Form(form), _): WithRejection<Form<ChangePasswordForm>, FormError>,
) -> ApiResult<impl IntoResponse> {
    let failed = |message: &str| Json(json!({ "status": "error", "message": message }));

    if form.new.chars().count() < MIN_PASSWORD_LEN {
        return Ok(failed(&format!(
            "New password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    match auth::authenticate(&state.pool, &user.userid, &form.current).await {
        Ok(_) => {}
        Err(Error::AuthError(_)) => {
            warn!("Password change with wrong current password");
            return Ok(failed("Current password is incorrect"));
        }
        Err(e) => return Err(ApiError::from_error(e)),
    }

    let hash = auth::hash_password(&form.new).map_err(ApiError::from_error)?;
    queries::update_staff_password(&state.pool, user.id, &hash)
        .await
        .map_err(ApiError::from_error)?;

    info!("Password changed");
    state
        .activity(
            LogLevel::Info,
            &format!("{} changed their password", user.userid),
        )
        .await;

    Ok(Json(json!({ "status": "success" })))
}
