use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Candidate application with uploaded CV
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: i64,
    pub job_id: i64,
    pub name: String,
    pub phone: String,
    /// Relative path of the uploaded CV
    pub resume_file: String,
    pub applied_at: DateTime<Utc>,
}

/// Application joined with the posting it was made for (for admin display).
/// Job columns are empty when the posting has since been deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationWithJob {
    pub id: i64,
    pub job_id: i64,
    pub name: String,
    pub phone: String,
    pub resume_file: String,
    pub applied_at: DateTime<Utc>,
    pub job_title: Option<String>,
    pub company: Option<String>,
}

/// Number of applications received on one day
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyCount {
    /// `YYYY-MM-DD`
    pub day: String,
    pub count: i64,
}

/// Input for creating an application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplication {
    pub job_id: i64,
    pub name: String,
    pub phone: String,
    pub resume_file: String,
}

impl CreateApplication {
    /// Check phone number format: digits with optional `+`, spaces and dashes
    pub fn is_valid_phone(phone: &str) -> bool {
        let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
        let allowed = phone
            .chars()
            .enumerate()
            .all(|(i, c)| c.is_ascii_digit() || c == ' ' || c == '-' || (c == '+' && i == 0));
        allowed && (7..=15).contains(&digits)
    }

    /// Validate the application input
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name is required".to_string());
        }
        if self.name.len() > 150 {
            return Err("Name must be at most 150 characters".to_string());
        }
        if !Self::is_valid_phone(self.phone.trim()) {
            return Err(format!("Invalid phone number: {}", self.phone));
        }
        if self.resume_file.is_empty() {
            return Err("Resume file is required".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_validation() {
        assert!(CreateApplication::is_valid_phone("+971 50 123 4567"));
        assert!(CreateApplication::is_valid_phone("0501234567"));
        assert!(CreateApplication::is_valid_phone("050-123-4567"));
        assert!(!CreateApplication::is_valid_phone("12345"));
        assert!(!CreateApplication::is_valid_phone("050+1234567"));
        assert!(!CreateApplication::is_valid_phone("call me"));
    }

    #[test]
    fn test_create_application_validation() {
        let valid = CreateApplication {
            job_id: 1,
            name: "Jane".to_string(),
            phone: "0501234567".to_string(),
            resume_file: "cvs/jane.pdf".to_string(),
        };
        assert!(valid.validate().is_ok());

        let no_name = CreateApplication {
            name: " ".to_string(),
            ..valid.clone()
        };
        assert!(no_name.validate().is_err());

        let no_file = CreateApplication {
            resume_file: String::new(),
            ..valid
        };
        assert!(no_file.validate().is_err());
    }
}
