use actix_web::{http::header, web, HttpResponse};
use tracing::instrument;

use crate::{errors::AppError, AppState};

/// Serves media stored by the local storage backend.
#[instrument(skip(state))]
pub async fn serve_upload(
    file_name: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let storage = state
        .local_storage
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Uploads are not served by this instance".into()))?;

    let stored = storage
        .read(&file_name)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Upload {} not found", file_name)))?;

    let content_type = stored
        .content_type
        .or_else(|| infer::get(&stored.bytes).map(|kind| kind.mime_type().to_string()))
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type))
        .insert_header((header::CACHE_CONTROL, "public, max-age=31536000, immutable"))
        .body(stored.bytes))
}
