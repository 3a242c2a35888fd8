use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Setting key holding the scrolling marquee text
pub const MARQUEE_KEY: &str = "marquee_text";

/// Longest marquee text accepted, in characters
pub const MARQUEE_MAX_CHARS: usize = 250;

/// Setting model
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
