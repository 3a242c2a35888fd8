//! Core library for AMS
//!
//! Shared types, the error type, uploaded-file storage and the website
//! backup engine used by the database and server crates.

pub mod backup;
pub mod error;
pub mod types;
pub mod upload;

// Re-exports
pub use backup::{BackupJob, BackupOutcome, BackupProgress, BackupTracker};
pub use error::{Error, Result};
pub use types::{JobStatus, LogLevel, MediaType, NotificationKind, StaffStatus};
pub use upload::{secure_filename, StoredFile, UploadStore};
