//! ML service request/response types.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::error::MlResult;

/// Multipart part name the ML service reads the image from.
pub const IMAGE_FIELD: &str = "image";

/// A file upload plus named form fields, sent as one multipart body.
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    /// File name reported in the part's Content-Disposition
    pub file_name: String,
    /// MIME type of the file
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
    /// Extra text fields, in insertion order
    pub fields: Vec<(String, String)>,
}

impl PredictionRequest {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
            fields: Vec::new(),
        }
    }

    /// Read the file from disk.
    pub async fn from_path(path: impl AsRef<Path>, content_type: impl Into<String>) -> MlResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        Ok(Self::new(file_name, content_type, bytes))
    }

    /// Append a text field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Build a fresh multipart form. Forms are consumed on send, so each
    /// attempt builds its own.
    pub fn to_form(&self) -> MlResult<Form> {
        let part = Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)?;

        let mut form = Form::new().part(IMAGE_FIELD, part);
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        Ok(form)
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}
