use ams_core::JobStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Job posting
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: i64,
    pub company: String,
    /// Position being hired for
    pub title: String,
    pub place: String,
    pub job_type: String,
    pub department: Option<String>,
    pub work_time: Option<String>,
    pub description: Option<String>,
    /// Relative path of the uploaded demand document
    pub demand_file: Option<String>,
    #[sqlx(rename = "status")]
    #[serde(rename = "status")]
    pub status_str: String,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Get status as enum; unknown values count as closed
    pub fn status(&self) -> JobStatus {
        JobStatus::from_str(&self.status_str).unwrap_or(JobStatus::Closed)
    }

    /// A job accepts applications while live and not past its expiry date
    pub fn is_open_on(&self, today: NaiveDate) -> bool {
        self.status() == JobStatus::Live && self.expiry_date.map_or(true, |d| d >= today)
    }
}

/// Input for creating a job posting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateJob {
    pub company: String,
    pub title: String,
    pub place: String,
    pub job_type: String,
    pub department: Option<String>,
    pub work_time: Option<String>,
    pub description: Option<String>,
    pub demand_file: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

impl CreateJob {
    /// Validate the job input
    pub fn validate(&self) -> Result<(), String> {
        if self.company.trim().is_empty() {
            return Err("Company name is required".to_string());
        }
        if self.title.trim().is_empty() {
            return Err("Position is required".to_string());
        }
        if self.company.len() > 200 || self.title.len() > 200 {
            return Err("Company and position must be at most 200 characters".to_string());
        }
        Ok(())
    }
}
