use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Contact form message
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMessage {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
}

impl CreateMessage {
    /// Validate the message input
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name is required".to_string());
        }
        if !self.email.contains('@') {
            return Err(format!("Invalid email address: {}", self.email));
        }
        if self.message.trim().is_empty() {
            return Err("Message cannot be empty".to_string());
        }
        if self.message.chars().count() > 5000 {
            return Err("Message must be at most 5000 characters".to_string());
        }
        Ok(())
    }
}
