use ams_core::MediaType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Image or video shown on the portal
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GalleryItem {
    pub id: i64,
    pub title: String,
    /// Path relative to the upload root, e.g. `images/banner.png`
    pub file_path: String,
    pub media_type: String,
    pub created_at: DateTime<Utc>,
}

impl GalleryItem {
    pub fn media(&self) -> Option<MediaType> {
        MediaType::from_str(&self.media_type)
    }

    /// Bare file name without the media directory
    pub fn filename(&self) -> &str {
        self.file_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.file_path)
    }

    /// Public URL the file is served from
    pub fn url(&self) -> String {
        format!("/static/{}", self.file_path)
    }
}

/// Input for creating a gallery item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGalleryItem {
    pub title: String,
    pub file_path: String,
    pub media_type: MediaType,
}
