use actix_multipart::form::{json::Json as MpJson, tempfile::TempFile, MultipartForm};
use tokio::fs;

use crate::{entities::project::ProjectForm, errors::AppError};

const FALLBACK_MIME: &str = "application/octet-stream";

/// A media file attached to the admin form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl UploadedFile {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        UploadedFile {
            bytes,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Reads a multipart temp file. The declared content type wins; when the
    /// client sent none, the type is sniffed from the bytes.
    pub async fn from_temp_file(temp: TempFile) -> Result<Self, AppError> {
        let bytes = fs::read(temp.file.path())
            .await
            .map_err(|e| AppError::upload(format!("unable to read uploaded file: {}", e)))?;

        let declared = temp
            .content_type
            .as_ref()
            .map(|m| m.essence_str().to_string())
            .filter(|m| m != FALLBACK_MIME);

        let mime_type = declared
            .or_else(|| infer::get(&bytes).map(|kind| kind.mime_type().to_string()))
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        Ok(UploadedFile {
            bytes,
            file_name: temp.file_name.unwrap_or_default(),
            mime_type,
        })
    }
}

/// Public URL of a file after it reached storage, with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub public_url: String,
    pub mime_type: String,
}

/// Multipart body of the admin form. Size limits come from the app's
/// `MultipartFormConfig`, which is built from `max_upload_mb`.
#[derive(Debug, MultipartForm)]
pub struct ProjectUpload {
    #[multipart(rename = "file")]
    pub file: Option<TempFile>,

    #[multipart(rename = "metadata")]
    pub metadata: MpJson<ProjectForm>,
}
