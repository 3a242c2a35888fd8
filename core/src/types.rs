//! Shared types

use serde::{Deserialize, Serialize};

/// Publication status of a job posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobStatus {
    #[default]
    Live,
    Closed,
}

impl JobStatus {
    /// Parse job status from string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Live" => Some(Self::Live),
            "Closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Convert job status to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "Live",
            Self::Closed => "Closed",
        }
    }
}

/// Employment status of a staff member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StaffStatus {
    #[default]
    Active,
    Inactive,
}

impl StaffStatus {
    /// Parse staff status from string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Active" => Some(Self::Active),
            "Inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    /// Convert staff status to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }

    /// The opposite status
    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }
}

/// Kind of gallery media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// Parse media type from string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            _ => None,
        }
    }

    /// Convert media type to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Upload sub-directory holding this kind of media
    pub fn upload_dir(&self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Video => "videos",
        }
    }
}

/// What an admin notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Application,
    Message,
    Staff,
    Job,
    Backup,
    System,
}

impl NotificationKind {
    /// Parse notification kind from string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "application" => Some(Self::Application),
            "message" => Some(Self::Message),
            "staff" => Some(Self::Staff),
            "job" => Some(Self::Job),
            "backup" => Some(Self::Backup),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    /// Convert notification kind to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Message => "message",
            Self::Staff => "staff",
            Self::Job => "job",
            Self::Backup => "backup",
            Self::System => "system",
        }
    }

    /// Icon shown next to the notification in the activity panel
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Application => "📄",
            Self::Message => "✉️",
            Self::Staff => "👤",
            Self::Job => "💼",
            Self::Backup => "💾",
            Self::System => "⚙️",
        }
    }
}

/// Severity of an activity log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parse log level from string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Convert log level to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}
