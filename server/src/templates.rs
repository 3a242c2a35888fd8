//! Askama page templates

use ams_core::MediaType;
use ams_database::{GalleryItem, Job};
use askama::Template;

// ============================================================================
// Public portal
// ============================================================================

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub marquee: String,
    pub jobs: Vec<JobCard>,
    pub gallery: Vec<GalleryCard>,
}

/// Job posting as shown on the careers page
#[derive(Debug, Clone)]
pub struct JobCard {
    pub id: i64,
    pub company: String,
    pub title: String,
    pub place: String,
    pub job_type: String,
    pub work_time: String,
    pub description: String,
    pub expiry: String,
    pub demand_url: Option<String>,
}

impl From<Job> for JobCard {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            company: job.company,
            title: job.title,
            place: job.place,
            job_type: job.job_type,
            work_time: job.work_time.unwrap_or_default(),
            description: job.description.unwrap_or_default(),
            expiry: job
                .expiry_date
                .map(|d| d.format("%d %b %Y").to_string())
                .unwrap_or_default(),
            demand_url: job.demand_file.map(|f| format!("/static/{}", f)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GalleryCard {
    pub title: String,
    pub url: String,
    pub is_video: bool,
}

impl From<GalleryItem> for GalleryCard {
    fn from(item: GalleryItem) -> Self {
        Self {
            is_video: item.media() == Some(MediaType::Video),
            url: item.url(),
            title: item.title,
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub userid: String,
}

// ============================================================================
// Admin console
// ============================================================================

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub user_name: String,
    pub stats: DashboardStats,
    pub marquee: String,
    pub marquee_max: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardStats {
    pub total_jobs: i64,
    pub total_applications: i64,
    pub total_staff: i64,
    pub unread_notifications: i64,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {}
