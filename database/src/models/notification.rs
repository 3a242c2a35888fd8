use ams_core::NotificationKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Admin activity panel notification
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    pub notification_type: String,
    pub title: String,
    pub description: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Get kind as enum
    pub fn kind(&self) -> NotificationKind {
        NotificationKind::from_str(&self.notification_type).unwrap_or(NotificationKind::System)
    }

    pub fn icon(&self) -> &'static str {
        self.kind().icon()
    }
}

/// Input for creating a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl CreateNotification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
        }
    }
}
