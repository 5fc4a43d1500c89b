//! Multipart image intake and the on-disk upload spool.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::Multipart;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ALLOWED_IMAGE_TYPES;
use crate::error::{ApiError, ApiResult};

/// An image received in a multipart request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Fields of the crop image upload form.
#[derive(Debug, Default)]
pub struct ImageForm {
    pub image: Option<ImageUpload>,
    pub crop_type: Option<String>,
    pub farm_id: Option<String>,
}

impl ImageForm {
    /// Drain the multipart stream. Unknown fields are skipped.
    pub async fn from_multipart(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let file_name = field.file_name().unwrap_or("upload").to_string();
                    let content_type = field.content_type().unwrap_or_default().to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Failed to read image: {}", e)))?;
                    form.image = Some(ImageUpload {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                "cropType" | "farmId" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid field {}: {}", name, e)))?;
                    if name == "cropType" {
                        form.crop_type = Some(value);
                    } else {
                        form.farm_id = Some(value);
                    }
                }
                _ => debug!(field = %name, "Ignoring multipart field"),
            }
        }

        Ok(form)
    }

    /// The uploaded image, or 400 when the form carried none.
    pub fn require_image(&mut self) -> ApiResult<ImageUpload> {
        self.image
            .take()
            .ok_or_else(|| ApiError::bad_request("No image uploaded"))
    }
}

/// A spooled upload on disk. Call [`SpooledFile::remove`] once forwarded.
#[derive(Debug)]
pub struct SpooledFile {
    path: PathBuf,
    content_type: String,
}

impl SpooledFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Delete the file. Failures are logged, not returned.
    pub async fn remove(self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            warn!(path = %self.path.display(), "Failed to remove spooled upload: {}", e);
        }
    }
}

/// Writes validated uploads to a local directory.
#[derive(Debug, Clone)]
pub struct UploadSpool {
    dir: PathBuf,
    max_size: usize,
}

impl UploadSpool {
    /// Create the spool, making the directory if needed.
    pub async fn new(dir: impl Into<PathBuf>, max_size: usize) -> std::io::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir, max_size })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Check type and size.
    pub fn validate(&self, upload: &ImageUpload) -> ApiResult<()> {
        if !ALLOWED_IMAGE_TYPES.contains(&upload.content_type.as_str()) {
            return Err(ApiError::bad_request(
                "Only image files are allowed (jpg, jpeg, png, webp)",
            ));
        }
        if upload.bytes.len() > self.max_size {
            return Err(ApiError::bad_request(format!(
                "Image exceeds the {} byte limit",
                self.max_size
            )));
        }
        Ok(())
    }

    /// Validate and write the upload under a fresh name.
    pub async fn spool(&self, upload: &ImageUpload) -> ApiResult<SpooledFile> {
        self.validate(upload)?;

        let path = self
            .dir
            .join(format!("crop-{}.{}", Uuid::new_v4(), extension(&upload.content_type)));
        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to spool upload: {}", e)))?;

        debug!(
            path = %path.display(),
            size = upload.bytes.len(),
            original = %upload.file_name,
            "Spooled upload"
        );

        Ok(SpooledFile {
            path,
            content_type: upload.content_type.clone(),
        })
    }
}

/// The ML service only accepts png/jpg/jpeg names, so webp uploads pass here
/// but are refused downstream and surface as an ML failure.
fn extension(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    }
}
