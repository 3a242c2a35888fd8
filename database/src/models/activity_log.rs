use ams_core::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Entry in the admin activity log
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityLog {
    pub id: i64,
    pub level: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_str(&self.level).unwrap_or(LogLevel::Info)
    }

    /// One line of the downloadable log file
    pub fn to_line(&self) -> String {
        format!(
            "[{}] {:<7} {}",
            self.created_at.format("%Y-%m-%d %H:%M:%S"),
            self.log_level().as_str().to_uppercase(),
            self.message
        )
    }
}
