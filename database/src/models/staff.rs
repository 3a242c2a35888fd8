use ams_core::StaffStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Staff member; also an admin console account when `login_enabled`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Staff {
    pub id: i64,
    pub name: String,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub alt_phone: Option<String>,
    pub email: Option<String>,
    pub marital_status: Option<String>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub userid: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Relative path of the uploaded photo
    pub photo: Option<String>,
    #[sqlx(rename = "status")]
    #[serde(rename = "status")]
    pub status_str: String,
    pub login_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Staff {
    /// Get status as enum; unknown values count as inactive
    pub fn status(&self) -> StaffStatus {
        StaffStatus::from_str(&self.status_str).unwrap_or(StaffStatus::Inactive)
    }

    /// Whether this account may sign in to the admin console
    pub fn can_login(&self) -> bool {
        self.login_enabled && self.status() == StaffStatus::Active
    }
}

/// Input for creating a staff record. The password must already be hashed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateStaff {
    pub name: String,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub alt_phone: Option<String>,
    pub email: Option<String>,
    pub marital_status: Option<String>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub userid: String,
    pub password_hash: String,
    pub photo: Option<String>,
    pub login_enabled: bool,
}

impl CreateStaff {
    /// User ids are ASCII letters, digits, `.`, `_` and `-`
    pub fn is_valid_userid(userid: &str) -> bool {
        !userid.is_empty()
            && userid.len() <= 50
            && userid
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    }

    /// Validate the staff input
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name is required".to_string());
        }
        if !Self::is_valid_userid(&self.userid) {
            return Err(format!("Invalid user id: '{}'", self.userid));
        }
        if self.password_hash.is_empty() {
            return Err("Password is required".to_string());
        }
        if let Some(ref email) = self.email {
            if !email.is_empty() && !email.contains('@') {
                return Err(format!("Invalid email address: {}", email));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_userid_validation() {
        assert!(CreateStaff::is_valid_userid("admin"));
        assert!(CreateStaff::is_valid_userid("j.doe-2"));
        assert!(!CreateStaff::is_valid_userid(""));
        assert!(!CreateStaff::is_valid_userid("john doe"));
        assert!(!CreateStaff::is_valid_userid("root;--"));
    }

    #[test]
    fn test_create_staff_validation() {
        let valid = CreateStaff {
            name: "John".to_string(),
            role: "staff".to_string(),
            userid: "john".to_string(),
            password_hash: "$argon2id$...".to_string(),
            email: Some("john@example.com".to_string()),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());

        let bad_email = CreateStaff {
            email: Some("nope".to_string()),
            ..valid.clone()
        };
        assert!(bad_email.validate().is_err());

        let no_password = CreateStaff {
            password_hash: String::new(),
            ..valid
        };
        assert!(no_password.validate().is_err());
    }
}
