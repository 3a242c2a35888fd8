//! Website backup
//!
//! A backup walks the site directory and writes every file into a single zip
//! archive. The work is blocking and is meant to run on a blocking thread
//! while HTTP clients poll the shared [`BackupTracker`].
//!
//! Only one backup may run at a time: [`BackupTracker::try_begin`] refuses a
//! second start until the running one has finished, failed or been
//! cancelled. Cancellation is checked between files; a cancelled run removes
//! its partial archive.

use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::{Error, Result};

pub const STATUS_IDLE: &str = "Idle";
pub const STATUS_PREPARING: &str = "Preparing backup";
pub const STATUS_RUNNING: &str = "Backing up files";
pub const STATUS_COMPLETED: &str = "Backup completed";
pub const STATUS_CANCELLED: &str = "Backup cancelled";

const ARCHIVE_PREFIX: &str = "website_backup_";

/// Snapshot of backup progress as reported to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupProgress {
    pub percent: u8,
    pub current: usize,
    pub total: usize,
    pub status: String,
    pub running: bool,
    /// File name of the last completed archive
    pub archive: Option<String>,
}

impl Default for BackupProgress {
    fn default() -> Self {
        Self {
            percent: 0,
            current: 0,
            total: 0,
            status: STATUS_IDLE.to_string(),
            running: false,
            archive: None,
        }
    }
}

fn percent_of(current: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((current.min(total) * 100) / total) as u8
}

/// Shared, synchronized backup state
#[derive(Debug, Default)]
pub struct BackupTracker {
    progress: Mutex<BackupProgress>,
    cancel: AtomicBool,
}

impl BackupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BackupProgress> {
        // A panicked writer leaves plain data behind; keep serving it.
        self.progress.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current progress
    pub fn snapshot(&self) -> BackupProgress {
        self.lock().clone()
    }

    /// Mark a backup as started, or fail if one is already running
    pub fn try_begin(&self) -> Result<()> {
        let mut progress = self.lock();
        if progress.running {
            return Err(Error::BackupError("A backup is already running".to_string()));
        }

        let archive = progress.archive.take();
        *progress = BackupProgress {
            status: STATUS_PREPARING.to_string(),
            running: true,
            archive,
            ..Default::default()
        };
        self.cancel.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Request cancellation. Returns false when nothing is running.
    pub fn cancel(&self) -> bool {
        let running = self.lock().running;
        if running {
            self.cancel.store(true, Ordering::SeqCst);
        }
        running
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    fn start_files(&self, total: usize) {
        let mut progress = self.lock();
        progress.total = total;
        progress.current = 0;
        progress.percent = 0;
        progress.status = STATUS_RUNNING.to_string();
    }

    fn advance(&self, current: usize) {
        let mut progress = self.lock();
        progress.current = current;
        progress.percent = percent_of(current, progress.total);
    }

    fn complete(&self, archive: String) {
        let mut progress = self.lock();
        progress.percent = 100;
        progress.current = progress.total;
        progress.status = STATUS_COMPLETED.to_string();
        progress.running = false;
        progress.archive = Some(archive);
    }

    fn cancelled(&self) {
        let mut progress = self.lock();
        progress.status = STATUS_CANCELLED.to_string();
        progress.running = false;
    }

    /// Finish a running backup as failed. Also used when the worker dies
    /// without reporting back.
    pub fn fail(&self, message: &str) {
        let mut progress = self.lock();
        progress.status = format!("Backup failed: {}", message);
        progress.running = false;
    }
}

/// Outcome of [`BackupJob::run`]
#[derive(Debug, Clone, PartialEq)]
pub enum BackupOutcome {
    Completed { archive: PathBuf, files: usize },
    Cancelled,
}

/// One backup run: which tree to archive and where to put the result
#[derive(Debug, Clone)]
pub struct BackupJob {
    source_dir: PathBuf,
    output_dir: PathBuf,
    exclude: Vec<String>,
}

impl BackupJob {
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            exclude: vec![".git".to_string(), "target".to_string()],
        }
    }

    /// Replace the list of file/directory names skipped anywhere in the tree
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// List every regular file to archive, sorted, skipping the output
    /// directory and excluded names. Unreadable entries are skipped.
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir)?;
        let source = fs::canonicalize(&self.source_dir)?;
        let output = fs::canonicalize(&self.output_dir)?;

        let mut files = Vec::new();
        let walker = WalkDir::new(&source)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                if e.path() == output.as_path() {
                    return false;
                }
                let name = e.file_name().to_string_lossy();
                !self.exclude.iter().any(|x| *x == name)
            });

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Skipping unreadable entry"),
            }
        }

        files.sort();
        Ok(files)
    }

    /// Run the backup, reporting into `tracker`.
    ///
    /// The tracker must already have been started with
    /// [`BackupTracker::try_begin`]; it is always left in a finished state.
    #[instrument(skip(self, tracker), fields(source = %self.source_dir.display()))]
    pub fn run(&self, tracker: &BackupTracker) -> Result<BackupOutcome> {
        self.run_observed(tracker, |_| {})
    }

    /// [`BackupJob::run`], calling `on_file` after each archived file
    fn run_observed(
        &self,
        tracker: &BackupTracker,
        on_file: impl FnMut(usize),
    ) -> Result<BackupOutcome> {
        let archive_name = format!(
            "{}{}.zip",
            ARCHIVE_PREFIX,
            Local::now().format("%Y%m%d_%H%M%S")
        );
        let archive_path = self.output_dir.join(&archive_name);

        match self.write_archive(&archive_path, tracker, on_file) {
            Ok(Some(files)) => {
                info!(archive = %archive_path.display(), files, "Backup completed");
                tracker.complete(archive_name);
                Ok(BackupOutcome::Completed {
                    archive: archive_path,
                    files,
                })
            }
            Ok(None) => {
                info!("Backup cancelled");
                remove_partial(&archive_path);
                tracker.cancelled();
                Ok(BackupOutcome::Cancelled)
            }
            Err(e) => {
                warn!(error = %e, "Backup failed");
                remove_partial(&archive_path);
                tracker.fail(&e.to_string());
                Err(e)
            }
        }
    }

    /// Returns the number of archived files, or `None` when cancelled
    fn write_archive(
        &self,
        archive_path: &Path,
        tracker: &BackupTracker,
        mut on_file: impl FnMut(usize),
    ) -> Result<Option<usize>> {
        if tracker.is_cancelled() {
            return Ok(None);
        }

        let files = self.collect_files()?;
        let source = fs::canonicalize(&self.source_dir)?;
        tracker.start_files(files.len());
        debug!(total = files.len(), "Collected files for backup");

        let mut zip = ZipWriter::new(File::create(archive_path)?);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut written = 0;
        for (i, path) in files.iter().enumerate() {
            if tracker.is_cancelled() {
                return Ok(None);
            }

            let name = entry_name(path.strip_prefix(&source).unwrap_or(path));
            match File::open(path) {
                Ok(mut file) => {
                    zip.start_file(name, options)?;
                    io::copy(&mut file, &mut zip)?;
                    written += 1;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable file"),
            }

            tracker.advance(i + 1);
            on_file(i + 1);
        }

        zip.finish()?;
        Ok(Some(written))
    }
}

fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove partial archive");
        }
    }
}

/// Zip entry names always use `/`
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Write `(entry name, file)` pairs into a zip archive.
///
/// Missing files are skipped so a stale database row cannot break the
/// whole download.
pub fn zip_files<W: Write + Seek>(entries: &[(String, PathBuf)], writer: W) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, path) in entries {
        match File::open(path) {
            Ok(mut file) => {
                zip.start_file(name.as_str(), options)?;
                io::copy(&mut file, &mut zip)?;
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping missing file"),
        }
    }

    Ok(zip.finish()?)
}

/// Newest backup archive in `output_dir`, if any
pub fn latest_archive(output_dir: &Path) -> Result<Option<PathBuf>> {
    let entries = match fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut latest: Option<PathBuf> = None;
    for entry in entries {
        let path = entry?.path();
        let is_archive = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(ARCHIVE_PREFIX) && n.ends_with(".zip"))
            .unwrap_or(false);

        // Names embed a sortable timestamp
        if is_archive && latest.as_ref().map_or(true, |l| path.file_name() > l.file_name()) {
            latest = Some(path);
        }
    }

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>hi</h1>").unwrap();
        fs::create_dir_all(dir.path().join("static/uploads/cvs")).unwrap();
        fs::write(dir.path().join("static/uploads/cvs/cv.pdf"), "%PDF").unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref").unwrap();
        dir
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(0, 0), 0);
        assert_eq!(percent_of(1, 4), 25);
        assert_eq!(percent_of(4, 4), 100);
        assert_eq!(percent_of(9, 4), 100);
    }

    #[test]
    fn test_tracker_rejects_concurrent_start() {
        let tracker = BackupTracker::new();
        assert!(!tracker.cancel());

        tracker.try_begin().unwrap();
        assert!(tracker.is_running());
        assert_eq!(tracker.snapshot().status, STATUS_PREPARING);
        assert!(tracker.try_begin().is_err());

        assert!(tracker.cancel());
        assert!(tracker.is_cancelled());
    }

    #[test]
    fn test_backup_run_completes() {
        let site = sample_site();
        let output = site.path().join("backups");
        let job = BackupJob::new(site.path(), &output);

        let tracker = BackupTracker::new();
        tracker.try_begin().unwrap();
        let outcome = job.run(&tracker).unwrap();

        let archive = match outcome {
            BackupOutcome::Completed { archive, files } => {
                assert_eq!(files, 2);
                archive
            }
            BackupOutcome::Cancelled => panic!("backup should complete"),
        };

        let progress = tracker.snapshot();
        assert_eq!(progress.status, STATUS_COMPLETED);
        assert_eq!(progress.percent, 100);
        assert_eq!(progress.total, 2);
        assert!(!progress.running);

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let mut names: Vec<_> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["index.html", "static/uploads/cvs/cv.pdf"]);

        assert_eq!(latest_archive(&output).unwrap(), Some(archive));

        // a second run after completion is allowed and never archives the first zip
        tracker.try_begin().unwrap();
        assert!(matches!(
            job.run(&tracker).unwrap(),
            BackupOutcome::Completed { files: 2, .. }
        ));
    }

    #[test]
    fn test_backup_cancelled_leaves_no_archive() {
        let site = sample_site();
        let output = site.path().join("backups");
        let job = BackupJob::new(site.path(), &output);

        let tracker = BackupTracker::new();
        tracker.try_begin().unwrap();
        tracker.cancel();

        assert_eq!(job.run(&tracker).unwrap(), BackupOutcome::Cancelled);
        assert_eq!(tracker.snapshot().status, STATUS_CANCELLED);
        assert!(!tracker.is_running());
        assert_eq!(latest_archive(&output).unwrap(), None);
    }

    #[test]
    fn test_backup_cancelled_mid_run_removes_partial_archive() {
        let site = sample_site();
        for i in 0..20 {
            fs::write(site.path().join(format!("page_{:02}.html", i)), "<p>page</p>").unwrap();
        }
        let output = site.path().join("backups");
        let job = BackupJob::new(site.path(), &output);

        let tracker = BackupTracker::new();
        tracker.try_begin().unwrap();

        let mut seen = 0;
        let outcome = job
            .run_observed(&tracker, |current| {
                seen = current;
                if current == 3 {
                    // The archive is open and partly written at this point
                    assert_eq!(fs::read_dir(&output).unwrap().count(), 1);
                    tracker.cancel();
                }
            })
            .unwrap();

        assert_eq!(outcome, BackupOutcome::Cancelled);
        assert_eq!(seen, 3);
        let progress = tracker.snapshot();
        assert_eq!(progress.status, STATUS_CANCELLED);
        assert_eq!(progress.total, 22);
        assert!(!progress.running);
        assert_eq!(latest_archive(&output).unwrap(), None);
        assert_eq!(fs::read_dir(&output).unwrap().count(), 0);
    }

    #[test]
    fn test_fail_releases_tracker() {
        let tracker = BackupTracker::new();
        tracker.try_begin().unwrap();

        tracker.fail("worker stopped");
        let progress = tracker.snapshot();
        assert!(!progress.running);
        assert_eq!(progress.status, "Backup failed: worker stopped");
        assert!(!tracker.cancel());
        assert!(tracker.try_begin().is_ok());
    }

    #[test]
    fn test_zip_files_skips_missing() {
        let site = sample_site();
        let entries = vec![
            ("cv.pdf".to_string(), site.path().join("static/uploads/cvs/cv.pdf")),
            ("gone.pdf".to_string(), site.path().join("nope.pdf")),
        ];

        let cursor = zip_files(&entries, Cursor::new(Vec::new())).unwrap();
        let zip = zip::ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(zip.len(), 1);
    }

    #[test]
    fn test_latest_archive_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(latest_archive(&dir.path().join("none")).unwrap(), None);
    }
}
