//! Buffered multipart form reading

use axum::extract::Multipart;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::{ApiError, ApiResult};

/// File part of a multipart form
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A fully read multipart form.
///
/// Browsers send an empty part for an untouched file input; such parts are
/// dropped, so [`MultipartForm::file`] only returns real uploads.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = Self::default();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Malformed multipart body");
                    return Err(ApiError::bad_request(format!("Malformed form data: {}", e)));
                }
            };

            let name = field.name().unwrap_or("").to_string();
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(|e| {
                warn!(error = %e, field = %name, "Failed to read multipart field");
                ApiError::bad_request(format!("Failed to read field '{}'", name))
            })?;

            match file_name {
                Some(file_name) if !file_name.is_empty() && !bytes.is_empty() => {
                    debug!(field = %name, file = %file_name, size = bytes.len(), "Received file");
                    form.files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            bytes: bytes.to_vec(),
                        },
                    );
                }
                Some(_) => {}
                None => {
                    form.fields
                        .insert(name, String::from_utf8_lossy(&bytes).into_owned());
                }
            }
        }

        Ok(form)
    }

    /// Trimmed text field, `None` when absent or blank
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Owned copy of an optional text field
    pub fn optional(&self, name: &str) -> Option<String> {
        self.text(name).map(str::to_string)
    }

    /// Text field that must be present
    pub fn required(&self, name: &str) -> ApiResult<&str> {
        self.text(name)
            .ok_or_else(|| ApiError::bad_request(format!("Missing required field '{}'", name)))
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }
}
