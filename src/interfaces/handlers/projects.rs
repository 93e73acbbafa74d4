use actix_multipart::form::MultipartForm;
use actix_web::{
    error::InternalError,
    http::header::CONTENT_TYPE,
    web, FromRequest, HttpRequest, HttpResponse,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    entities::{
        project::{ProjectForm, ProjectType},
        upload::{ProjectUpload, UploadedFile},
    },
    errors::AppError,
    use_cases::extractors::AdminToken,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct TypeFilter {
    #[serde(rename = "type")]
    pub project_type: Option<String>,
}

impl TypeFilter {
    /// `None` and `"all"` mean no filtering.
    fn parse(&self) -> Result<Option<ProjectType>, AppError> {
        match self.project_type.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(value) => value.parse().map(Some),
        }
    }
}

#[instrument(skip(state))]
pub async fn list_projects(
    state: web::Data<AppState>,
    query: web::Query<TypeFilter>,
) -> Result<HttpResponse, AppError> {
    let filter = query.parse()?;
    let projects = state.project_handler.list_projects(filter).await?;
    Ok(HttpResponse::Ok().json(projects))
}

#[instrument(skip(state))]
pub async fn gallery(
    state: web::Data<AppState>,
    query: web::Query<TypeFilter>,
) -> Result<HttpResponse, AppError> {
    let filter = query.parse()?;
    let cards = state.project_handler.gallery(filter).await?;
    Ok(HttpResponse::Ok().json(cards))
}

#[instrument(skip(state))]
pub async fn get_project(
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let project = state.project_handler.get_project(&project_id).await?;
    Ok(HttpResponse::Ok().json(project))
}

#[instrument(skip(_admin, state))]
pub async fn edit_form(
    _admin: AdminToken,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let form = state.project_handler.edit_form(&project_id).await?;
    Ok(HttpResponse::Ok().json(form))
}

#[instrument(skip(_admin, state, req, payload))]
pub async fn create_project(
    _admin: AdminToken,
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, actix_web::Error> {
    let (form, upload) = read_submission(&req, payload).await?;

    let project = state.project_handler.create_project(form, upload).await?;
    Ok(HttpResponse::Created().json(project))
}

#[instrument(skip(_admin, state, req, payload))]
pub async fn update_project(
    _admin: AdminToken,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, actix_web::Error> {
    let (form, upload) = read_submission(&req, payload).await?;

    let project = state.project_handler
        .update_project(&project_id, form, upload)
        .await?;
    Ok(HttpResponse::Ok().json(project))
}

#[instrument(skip(_admin, state))]
pub async fn delete_project(
    _admin: AdminToken,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.project_handler.delete_project(&project_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, PartialEq, Eq)]
enum SubmissionKind {
    Json,
    Multipart,
}

fn submission_kind(req: &HttpRequest) -> Option<SubmissionKind> {
    let content_type = req.headers().get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();

    if essence == "application/json" || essence.ends_with("+json") {
        Some(SubmissionKind::Json)
    } else if essence == "multipart/form-data" {
        Some(SubmissionKind::Multipart)
    } else {
        None
    }
}

/// Reads the admin form from a JSON body, or from a multipart body with a
/// `metadata` JSON part and an optional `file` part. JSON errors go through
/// the app's `JsonConfig`; any other content type is a 415.
async fn read_submission(
    req: &HttpRequest,
    payload: web::Payload,
) -> Result<(ProjectForm, Option<UploadedFile>), actix_web::Error> {
    let mut payload = payload.into_inner();

    match submission_kind(req) {
        Some(SubmissionKind::Json) => {
            let form = web::Json::<ProjectForm>::from_request(req, &mut payload).await?;
            Ok((form.into_inner(), None))
        }
        Some(SubmissionKind::Multipart) => {
            let multipart = MultipartForm::<ProjectUpload>::from_request(req, &mut payload)
                .await
                .map_err(multipart_error)?;

            let ProjectUpload { file, metadata } = multipart.into_inner();
            let upload = match file {
                Some(temp) if temp.size > 0 => Some(UploadedFile::from_temp_file(temp).await?),
                _ => None,
            };
            Ok((metadata.into_inner(), upload))
        }
        None => {
            let response = HttpResponse::UnsupportedMediaType().json(serde_json::json!({
                "error": "Request must be either application/json or multipart/form-data"
            }));
            Err(InternalError::from_response("unsupported content type", response).into())
        }
    }
}

/// Keeps the multipart extractor's status code, with a `{ "error": ... }` body.
fn multipart_error(err: actix_web::Error) -> actix_web::Error {
    let status = err.as_response_error().status_code();
    let response = HttpResponse::build(status).json(serde_json::json!({
        "error": format!("Multipart payload error: {}", err)
    }));
    InternalError::from_response(err.to_string(), response).into()
}
