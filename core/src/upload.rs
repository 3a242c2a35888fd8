//! Uploaded file storage
//!
//! Every uploaded file lives under a single root directory, grouped in
//! sub-directories per kind (`cvs`, `demands`, `photos`, `images`, `videos`).
//! Database rows only ever store the path relative to that root.

use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::{Error, Result};

/// Sub-directory for candidate CVs
pub const CV_DIR: &str = "cvs";
/// Sub-directory for job demand documents
pub const DEMAND_DIR: &str = "demands";
/// Sub-directory for staff photos
pub const PHOTO_DIR: &str = "photos";
/// Sub-directories served publicly under `/static`; CVs are never among them
pub const PUBLIC_DIRS: &[&str] = &[DEMAND_DIR, PHOTO_DIR, "images", "videos"];

pub const CV_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];
pub const DEMAND_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "png", "jpg", "jpeg"];
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov"];

/// Reduce a client supplied filename to a safe ASCII basename.
///
/// Directory components are dropped, whitespace runs become `_`, and
/// anything outside `[A-Za-z0-9._-]` is removed. Leading and trailing dots
/// and underscores are stripped so the result can never be hidden or
/// relative. Returns `None` when nothing usable is left.
pub fn secure_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let joined = base.split_whitespace().collect::<Vec<_>>().join("_");
    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = filtered.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Check a filename's extension against an allow-list (case-insensitive)
pub fn has_allowed_extension(name: &str, allowed: &[&str]) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// A file written by [`UploadStore::save`]
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Path relative to the upload root, always `/`-separated
    pub relative: String,
    /// Absolute location on disk
    pub path: PathBuf,
    /// Bytes written
    pub size: usize,
}

/// Filesystem store rooted at the configured upload directory
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save uploaded bytes under `subdir` using the sanitized original name.
    ///
    /// When the name is already taken a numeric suffix is appended so an
    /// earlier upload is never overwritten.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save(&self, subdir: &str, original_name: &str, bytes: &[u8]) -> Result<StoredFile> {
        let name = secure_filename(original_name)
            .ok_or_else(|| Error::UploadError(format!("Invalid filename: {:?}", original_name)))?;

        let dir = self.root.join(subdir);
        fs::create_dir_all(&dir).await?;

        let (name, path) = write_unique(&dir, &name, bytes).await?;

        info!(path = %path.display(), "Stored uploaded file");

        Ok(StoredFile {
            relative: format!("{}/{}", subdir, name),
            path,
            size: bytes.len(),
        })
    }

    /// Resolve a stored relative path, refusing anything that escapes the root
    pub fn path_of(&self, relative: &str) -> Result<PathBuf> {
        let rel = Path::new(relative);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.is_empty() || escapes {
            return Err(Error::UploadError(format!("Invalid stored path: {}", relative)));
        }
        Ok(self.root.join(rel))
    }

    /// Delete a stored file. A file that is already gone is not an error.
    #[instrument(skip(self))]
    pub async fn remove(&self, relative: &str) -> Result<()> {
        let path = self.path_of(relative)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "Removed uploaded file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Uploaded file already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every regular file in a sub-directory, returning how many went
    #[instrument(skip(self))]
    pub async fn clear(&self, subdir: &str) -> Result<usize> {
        let dir = self.root.join(subdir);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }

        info!(dir = %dir.display(), removed, "Cleared upload directory");
        Ok(removed)
    }
}

/// `name` for attempt 0, `stem_N.ext` for attempt N
fn candidate_name(name: &str, attempt: usize) -> String {
    if attempt == 0 {
        return name.to_string();
    }

    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, attempt, ext),
        None => format!("{}_{}", stem, attempt),
    }
}

/// Claim the first free candidate name with `create_new` and write into it.
///
/// Creation is atomic, so concurrent uploads of the same name each get
/// their own file.
async fn write_unique(dir: &Path, name: &str, bytes: &[u8]) -> Result<(String, PathBuf)> {
    let mut attempt = 0;
    let (candidate, path, mut file) = loop {
        let candidate = candidate_name(name, attempt);
        let path = dir.join(&candidate);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => break (candidate, path, file),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    };

    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        // Release the claimed name
        let _ = fs::remove_file(&path).await;
        return Err(e.into());
    }

    Ok((candidate, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My CV.pdf"), Some("My_CV.pdf".to_string()));
        assert_eq!(
            secure_filename("../../etc/passwd"),
            Some("passwd".to_string())
        );
        assert_eq!(
            secure_filename("C:\\Users\\me\\resume.docx"),
            Some("resume.docx".to_string())
        );
        assert_eq!(secure_filename(".bashrc"), Some("bashrc".to_string()));
        assert_eq!(secure_filename("résumé.pdf"), Some("rsum.pdf".to_string()));
        assert_eq!(secure_filename("..."), None);
        assert_eq!(secure_filename(""), None);
    }

    #[test]
    fn test_allowed_extensions() {
        assert!(has_allowed_extension("cv.PDF", CV_EXTENSIONS));
        assert!(has_allowed_extension("photo.jpeg", IMAGE_EXTENSIONS));
        assert!(!has_allowed_extension("script.sh", CV_EXTENSIONS));
        assert!(!has_allowed_extension("noext", CV_EXTENSIONS));
    }

    #[test]
    fn test_path_of_rejects_escapes() {
        let store = UploadStore::new("/srv/uploads");
        assert!(store.path_of("cvs/a.pdf").is_ok());
        assert!(store.path_of("../secret").is_err());
        assert!(store.path_of("/etc/passwd").is_err());
        assert!(store.path_of("").is_err());
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let stored = store.save(CV_DIR, "jane doe.pdf", b"%PDF").await.unwrap();
        assert_eq!(stored.relative, "cvs/jane_doe.pdf");
        assert_eq!(stored.size, 4);
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"%PDF");

        store.remove(&stored.relative).await.unwrap();
        assert!(!stored.path.exists());

        // removing twice is fine
        store.remove(&stored.relative).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let first = store.save(CV_DIR, "cv.pdf", b"one").await.unwrap();
        let second = store.save(CV_DIR, "cv.pdf", b"two").await.unwrap();
        let third = store.save(CV_DIR, "cv.pdf", b"three").await.unwrap();

        assert_eq!(first.relative, "cvs/cv.pdf");
        assert_eq!(second.relative, "cvs/cv_1.pdf");
        assert_eq!(third.relative, "cvs/cv_2.pdf");
        assert_eq!(std::fs::read(&first.path).unwrap(), b"one");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .save(CV_DIR, "cv.pdf", format!("cv {}", i).as_bytes())
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut relatives = std::collections::HashSet::new();
        for handle in handles {
            let stored = handle.await.unwrap();
            assert!(stored.path.exists());
            relatives.insert(stored.relative);
        }

        assert_eq!(relatives.len(), 32);
        assert_eq!(std::fs::read_dir(dir.path().join(CV_DIR)).unwrap().count(), 32);
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        assert_eq!(store.clear(CV_DIR).await.unwrap(), 0);

        store.save(CV_DIR, "a.pdf", b"a").await.unwrap();
        store.save(CV_DIR, "b.pdf", b"b").await.unwrap();
        assert_eq!(store.clear(CV_DIR).await.unwrap(), 2);
        assert_eq!(std::fs::read_dir(dir.path().join(CV_DIR)).unwrap().count(), 0);
    }
}
