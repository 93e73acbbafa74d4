use std::fmt;

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

pub const INVALID_DATE_FORMAT_MESSAGE: &str =
    "Le format de la date doit être \"Mois Année\" (ex: Janvier 2024)";

#[derive(Debug)]
pub enum AppError {
    InvalidDateFormat,
    Upload(String),
    Store {
        operation: StoreOperation,
        cause: String,
    },
    ValidationError(Vec<FieldError>),
    NotFound(String),
    InvalidInput(String),
    UnauthorizedAccess,
    InternalError(String),
}

/// Record store operation that failed; drives the banner shown to the user.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    #[display("list")]
    List,
    #[display("get")]
    Get,
    #[display("create")]
    Create,
    #[display("update")]
    Update,
    #[display("delete")]
    Delete,
    #[display("ping")]
    Ping,
}

impl StoreOperation {
    pub fn banner(&self) -> &'static str {
        match self {
            StoreOperation::List | StoreOperation::Get | StoreOperation::Ping => {
                "Erreur lors du chargement des projets"
            }
            StoreOperation::Create => "Erreur lors de l'ajout du projet",
            StoreOperation::Update => "Erreur lors de la mise à jour du projet",
            StoreOperation::Delete => "Erreur lors de la suppression du projet",
        }
    }
}

impl AppError {
    pub fn store(operation: StoreOperation, cause: impl fmt::Display) -> Self {
        AppError::Store {
            operation,
            cause: cause.to_string(),
        }
    }

    pub fn upload(cause: impl fmt::Display) -> Self {
        AppError::Upload(cause.to_string())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidDateFormat => write!(f, "{}", INVALID_DATE_FORMAT_MESSAGE),
            AppError::Upload(msg) => write!(f, "Erreur lors de l'envoi du fichier : {}", msg),
            AppError::Store { operation, .. } => write!(f, "{}", operation.banner()),
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::UnauthorizedAccess => write!(f, "Unauthorized access"),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationError(errors) => {
                serde_json::json!({
                    "error": "Validation failed",
                    "details": errors
                })
            }
            AppError::InvalidDateFormat => {
                serde_json::json!({
                    "error": self.to_string(),
                    "field": "displayDate"
                })
            }
            AppError::Store { operation, cause } => {
                tracing::error!(%operation, %cause, "record store failure");
                serde_json::json!({"error": operation.banner()})
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                serde_json::json!({"error": "Internal server error"})
            }
            _ => {
                serde_json::json!({"error": self.to_string()})
            }
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidDateFormat => StatusCode::BAD_REQUEST,
            AppError::Upload(_) => StatusCode::BAD_GATEWAY,
            AppError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::UnauthorizedAccess => StatusCode::UNAUTHORIZED,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();
        field_errors.sort_by(|a, b| a.field.cmp(&b.field));

        AppError::ValidationError(field_errors)
    }
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_shows_banner_not_cause() {
        let err = AppError::store(StoreOperation::Delete, "connection reset by peer");

        assert_eq!(err.to_string(), "Erreur lors de la suppression du projet");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upload_error_appends_collaborator_message() {
        let err = AppError::upload("bucket not found");

        assert_eq!(err.to_string(), "Erreur lors de l'envoi du fichier : bucket not found");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn invalid_date_format_is_a_client_error() {
        let err = AppError::InvalidDateFormat;

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("Janvier 2024"));
    }
}
