use uuid::Uuid;

use crate::errors::AppError;

/// Parses a project id taken from a path segment.
pub fn valid_uuid(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim())
        .map_err(|_| AppError::InvalidInput(format!("Invalid project id: {}", id)))
}
