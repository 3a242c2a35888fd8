//! Job posting queries

use ams_core::{Error, JobStatus, Result};
use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{Pool, Sqlite};
use tracing::instrument;

use crate::map_row_error;
use crate::models::{CreateJob, Job};

const JOB_COLUMNS: &str = "id, company, title, place, job_type, department, work_time, \
     description, demand_file, status, expiry_date, created_at";

/// List all jobs, newest first
#[instrument(skip(pool))]
pub async fn list_jobs(pool: &Pool<Sqlite>) -> Result<Vec<Job>> {
    sqlx::query_as::<_, Job>(&format!(
        "SELECT {} FROM jobs ORDER BY created_at DESC, id DESC",
        JOB_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list jobs")
    .map_err(|e| Error::DatabaseError(e.to_string()))
}

/// List jobs that are live and not expired as of `today`
#[instrument(skip(pool))]
pub async fn list_live_jobs(pool: &Pool<Sqlite>, today: NaiveDate) -> Result<Vec<Job>> {
    sqlx::query_as::<_, Job>(&format!(
        r#"
        SELECT {}
        FROM jobs
        WHERE status = ? AND (expiry_date IS NULL OR expiry_date >= ?)
        ORDER BY created_at DESC, id DESC
        "#,
        JOB_COLUMNS
    ))
    .bind(JobStatus::Live.as_str())
    .bind(today)
    .fetch_all(pool)
    .await
    .context("Failed to list live jobs")
    .map_err(|e| Error::DatabaseError(e.to_string()))
}

/// Get job by ID
#[instrument(skip(pool))]
pub async fn get_job(pool: &Pool<Sqlite>, id: i64) -> Result<Job> {
    sqlx::query_as::<_, Job>(&format!("SELECT {} FROM jobs WHERE id = ?", JOB_COLUMNS))
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| map_row_error(e, "Job"))
}

/// Create a new job posting
#[instrument(skip(pool, input), fields(company = %input.company))]
pub async fn create_job(pool: &Pool<Sqlite>, input: &CreateJob) -> Result<i64> {
    input.validate().map_err(Error::ValidationError)?;

    let result = sqlx::query(
        r#"
        INSERT INTO jobs (company, title, place, job_type, department, work_time,
                          description, demand_file, status, expiry_date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.company.trim())
    .bind(input.title.trim())
    .bind(input.place.trim())
    .bind(input.job_type.trim())
    .bind(&input.department)
    .bind(&input.work_time)
    .bind(&input.description)
    .bind(&input.demand_file)
    .bind(JobStatus::Live.as_str())
    .bind(input.expiry_date)
    .execute(pool)
    .await
    .context("Failed to create job")
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.last_insert_rowid())
}

/// Set the publication status of a job
#[instrument(skip(pool))]
pub async fn update_job_status(pool: &Pool<Sqlite>, id: i64, status: JobStatus) -> Result<()> {
    let result = sqlx::query("UPDATE jobs SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update job status")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Job".to_string()));
    }
    Ok(())
}

/// Delete a job, returning the removed row so its demand file can be cleaned up
#[instrument(skip(pool))]
pub async fn delete_job(pool: &Pool<Sqlite>, id: i64) -> Result<Job> {
    let job = get_job(pool, id).await?;

    sqlx::query("DELETE FROM jobs WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete job")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(job)
}

/// Count all jobs
#[instrument(skip(pool))]
pub async fn count_jobs(pool: &Pool<Sqlite>) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
        .fetch_one(pool)
        .await
        .context("Failed to count jobs")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;
    Ok(count.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pool;

    fn sample(company: &str, expiry: Option<NaiveDate>) -> CreateJob {
        CreateJob {
            company: company.to_string(),
            title: "Electrician".to_string(),
            place: "Doha".to_string(),
            job_type: "Full time".to_string(),
            expiry_date: expiry,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_job_lifecycle() {
        let pool = test_pool().await;

        let id = create_job(&pool, &sample("Acme", None)).await.unwrap();
        assert!(id > 0);

        let job = get_job(&pool, id).await.unwrap();
        assert_eq!(job.company, "Acme");
        assert_eq!(job.status(), JobStatus::Live);

        update_job_status(&pool, id, JobStatus::Closed).await.unwrap();
        assert_eq!(get_job(&pool, id).await.unwrap().status(), JobStatus::Closed);

        assert_eq!(count_jobs(&pool).await.unwrap(), 1);

        let deleted = delete_job(&pool, id).await.unwrap();
        assert_eq!(deleted.id, id);
        assert!(matches!(get_job(&pool, id).await, Err(Error::NotFound(_))));
        assert!(matches!(delete_job(&pool, id).await, Err(Error::NotFound(_))));
        assert!(matches!(
            update_job_status(&pool, id, JobStatus::Live).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_live_jobs_filters_expired_and_closed() {
        let pool = test_pool().await;
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        let open = create_job(&pool, &sample("Open", None)).await.unwrap();
        let until_today = create_job(&pool, &sample("Today", Some(today))).await.unwrap();
        create_job(&pool, &sample("Expired", today.pred_opt()))
            .await
            .unwrap();
        let closed = create_job(&pool, &sample("Closed", None)).await.unwrap();
        update_job_status(&pool, closed, JobStatus::Closed).await.unwrap();

        let mut ids: Vec<i64> = list_live_jobs(&pool, today)
            .await
            .unwrap()
            .into_iter()
            .map(|j| j.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec![open, until_today]);

        assert_eq!(list_jobs(&pool).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_create_job_rejects_invalid() {
        let pool = test_pool().await;
        let result = create_job(&pool, &sample("", None)).await;
        assert!(matches!(result, Err(Error::ValidationError(_))));
    }
}
