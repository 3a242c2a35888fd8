//! Admin dashboard page and summary stats

use ams_database::{
    queries,
    sqlx::{Pool, Sqlite},
    MARQUEE_KEY, MARQUEE_MAX_CHARS,
};
use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Extension, Json, Router,
};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Map, Value};
use tracing::instrument;

use super::public::DEFAULT_MARQUEE;
use super::{ApiError, ApiResult, AppError};
use crate::auth::SessionUser;
use crate::state::AppState;
use crate::templates::{AdminTemplate, DashboardStats};

/// Days covered by the upload chart, today included
const CHART_DAYS: i64 = 7;

/// Create dashboard router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_page))
        .route("/dashboard-stats", get(dashboard_stats))
}

async fn load_stats(pool: &Pool<Sqlite>) -> ams_core::Result<DashboardStats> {
    Ok(DashboardStats {
        total_jobs: queries::count_jobs(pool).await?,
        total_applications: queries::count_applications(pool).await?,
        total_staff: queries::count_staff(pool).await?,
        unread_notifications: queries::count_unread(pool).await?,
    })
}

/// Dashboard page handler
#[instrument(skip(state, user), fields(user = %user.userid))]
async fn admin_page(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<Html<String>, AppError> {
    let stats = load_stats(&state.pool).await?;
    let marquee = queries::get_setting_value_or(&state.pool, MARQUEE_KEY, DEFAULT_MARQUEE).await?;

    let template = AdminTemplate {
        user_name: user.name,
        stats,
        marquee,
        marquee_max: MARQUEE_MAX_CHARS,
    };
    Ok(Html(template.render()?))
}

/// One entry per day for the last week, zero-filled, oldest first
fn daily_series(counts: &[(String, i64)], today: NaiveDate) -> Map<String, Value> {
    let mut series = Map::new();
    for offset in (0..CHART_DAYS).rev() {
        let day = (today - Duration::days(offset)).format("%Y-%m-%d").to_string();
        let count = counts
            .iter()
            .find(|(d, _)| *d == day)
            .map_or(0, |(_, c)| *c);
        series.insert(day, json!(count));
    }
    series
}

#[instrument(skip(state))]
async fn dashboard_stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let today = Utc::now().date_naive();
    let since = today - Duration::days(CHART_DAYS - 1);

    let counts: Vec<(String, i64)> = queries::daily_application_counts(&state.pool, since)
        .await
        .map_err(ApiError::from_error)?
        .into_iter()
        .map(|c| (c.day, c.count))
        .collect();

    let stats = load_stats(&state.pool)
        .await
        .map_err(ApiError::from_error)?;

    Ok(Json(json!({
        "daily_uploads": daily_series(&counts, today),
        "total_jobs": stats.total_jobs,
        "total_applications": stats.total_applications,
        "total_staff": stats.total_staff,
        "unread_notifications": stats.unread_notifications,
    })))
}
