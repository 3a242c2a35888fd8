//! Application (candidate CV) queries

use ams_core::{Error, Result};
use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{Pool, Sqlite};
use tracing::instrument;

use crate::map_row_error;
use crate::models::{Application, ApplicationWithJob, CreateApplication, DailyCount};

/// List all applications with their job title, newest first
#[instrument(skip(pool))]
pub async fn list_applications(pool: &Pool<Sqlite>) -> Result<Vec<ApplicationWithJob>> {
    sqlx::query_as::<_, ApplicationWithJob>(
        r#"
        SELECT a.id, a.job_id, a.name, a.phone, a.resume_file, a.applied_at,
               j.title AS job_title, j.company AS company
        FROM applications a
        LEFT JOIN jobs j ON j.id = a.job_id
        ORDER BY a.applied_at DESC, a.id DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list applications")
    .map_err(|e| Error::DatabaseError(e.to_string()))
}

/// List applications made for one job
#[instrument(skip(pool))]
pub async fn list_applications_for_job(pool: &Pool<Sqlite>, job_id: i64) -> Result<Vec<Application>> {
    sqlx::query_as::<_, Application>(
        r#"
        SELECT id, job_id, name, phone, resume_file, applied_at
        FROM applications
        WHERE job_id = ?
        ORDER BY applied_at DESC, id DESC
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await
    .context("Failed to list applications for job")
    .map_err(|e| Error::DatabaseError(e.to_string()))
}

/// Get application by ID
#[instrument(skip(pool))]
pub async fn get_application(pool: &Pool<Sqlite>, id: i64) -> Result<Application> {
    sqlx::query_as::<_, Application>(
        r#"
        SELECT id, job_id, name, phone, resume_file, applied_at
        FROM applications
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(|e| map_row_error(e, "Application"))
}

/// Create a new application
#[instrument(skip(pool, input), fields(job_id = input.job_id))]
pub async fn create_application(pool: &Pool<Sqlite>, input: &CreateApplication) -> Result<i64> {
    input.validate().map_err(Error::ValidationError)?;

    let result = sqlx::query(
        r#"
        INSERT INTO applications (job_id, name, phone, resume_file)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(input.job_id)
    .bind(input.name.trim())
    .bind(input.phone.trim())
    .bind(&input.resume_file)
    .execute(pool)
    .await
    .context("Failed to create application")
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.last_insert_rowid())
}

/// Delete an application, returning the removed row so its CV can be cleaned up
#[instrument(skip(pool))]
pub async fn delete_application(pool: &Pool<Sqlite>, id: i64) -> Result<Application> {
    let application = get_application(pool, id).await?;

    sqlx::query("DELETE FROM applications WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete application")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(application)
}

/// Delete every application, returning the removed rows
#[instrument(skip(pool))]
pub async fn delete_all_applications(pool: &Pool<Sqlite>) -> Result<Vec<Application>> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin transaction")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    let removed = sqlx::query_as::<_, Application>(
        "SELECT id, job_id, name, phone, resume_file, applied_at FROM applications",
    )
    .fetch_all(&mut *tx)
    .await
    .context("Failed to load applications")
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    sqlx::query("DELETE FROM applications")
        .execute(&mut *tx)
        .await
        .context("Failed to delete applications")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    tx.commit()
        .await
        .context("Failed to commit transaction")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(removed)
}

/// Count all applications
#[instrument(skip(pool))]
pub async fn count_applications(pool: &Pool<Sqlite>) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM applications")
        .fetch_one(pool)
        .await
        .context("Failed to count applications")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;
    Ok(count.0)
}

/// Applications received per day since `since` (inclusive). Days without
/// applications are absent.
#[instrument(skip(pool))]
pub async fn daily_application_counts(pool: &Pool<Sqlite>, since: NaiveDate) -> Result<Vec<DailyCount>> {
    sqlx::query_as::<_, DailyCount>(
        r#"
        SELECT date(applied_at) AS day, COUNT(*) AS count
        FROM applications
        WHERE date(applied_at) >= ?
        GROUP BY date(applied_at)
        ORDER BY day
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await
    .context("Failed to count daily applications")
    .map_err(|e| Error::DatabaseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateJob;
    use crate::queries::jobs;
    use crate::test_pool;
    use chrono::Utc;

    fn sample(job_id: i64, name: &str) -> CreateApplication {
        CreateApplication {
            job_id,
            name: name.to_string(),
            phone: "+971501234567".to_string(),
            resume_file: format!("cvs/{}.pdf", name),
        }
    }

    #[tokio::test]
    async fn test_application_lifecycle() {
        let pool = test_pool().await;
        let job_id = jobs::create_job(
            &pool,
            &CreateJob {
                company: "Acme".to_string(),
                title: "Mason".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let id = create_application(&pool, &sample(job_id, "jane")).await.unwrap();
        let app = get_application(&pool, id).await.unwrap();
        assert_eq!(app.resume_file, "cvs/jane.pdf");

        let listed = list_applications(&pool).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].job_title.as_deref(), Some("Mason"));

        assert_eq!(list_applications_for_job(&pool, job_id).await.unwrap().len(), 1);

        let removed = delete_application(&pool, id).await.unwrap();
        assert_eq!(removed.name, "jane");
        assert!(matches!(get_application(&pool, id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_application_survives_job_deletion() {
        let pool = test_pool().await;
        let job_id = jobs::create_job(
            &pool,
            &CreateJob {
                company: "Acme".to_string(),
                title: "Mason".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        create_application(&pool, &sample(job_id, "jane")).await.unwrap();
        jobs::delete_job(&pool, job_id).await.unwrap();

        let listed = list_applications(&pool).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].job_title, None);
    }

    #[tokio::test]
    async fn test_delete_all_and_daily_counts() {
        let pool = test_pool().await;
        create_application(&pool, &sample(1, "a")).await.unwrap();
        create_application(&pool, &sample(1, "b")).await.unwrap();
        create_application(&pool, &sample(2, "c")).await.unwrap();

        let today = Utc::now().date_naive();
        let counts = daily_application_counts(&pool, today).await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].day, today.format("%Y-%m-%d").to_string());
        assert_eq!(counts[0].count, 3);

        let removed = delete_all_applications(&pool).await.unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(count_applications(&pool).await.unwrap(), 0);
    }
}
