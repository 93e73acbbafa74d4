use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;

pub mod local;
pub mod remote;

/// Object storage receiving project media.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Stores `bytes` under `file_name` and returns the storage path.
    /// `content_type` is the MIME type declared for the file and is kept
    /// with it so it can be served back as such.
    async fn upload(&self, bytes: &[u8], file_name: &str, content_type: &str) -> Result<String, AppError>;

    /// Publicly reachable URL of a stored path.
    fn public_url(&self, storage_path: &str) -> String;
}

#[async_trait]
impl<T: FileStorage + ?Sized> FileStorage for Arc<T> {
    async fn upload(&self, bytes: &[u8], file_name: &str, content_type: &str) -> Result<String, AppError> {
        (**self).upload(bytes, file_name, content_type).await
    }

    fn public_url(&self, storage_path: &str) -> String {
        (**self).public_url(storage_path)
    }
}

/// Collision-resistant name for an upload: a random UUID plus the original
/// extension, lower-cased.
pub fn storage_file_name(original: &str) -> String {
    let extension = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_original_extension() {
        let name = storage_file_name("Demo Screen.GIF");

        assert!(name.ends_with(".gif"));
        let stem = name.trim_end_matches(".gif");
        assert!(Uuid::parse_str(stem).is_ok());
    }

    #[test]
    fn names_are_unique() {
        assert_ne!(storage_file_name("a.png"), storage_file_name("a.png"));
    }

    #[test]
    fn missing_extension_gives_bare_uuid() {
        let name = storage_file_name("README");
        assert!(Uuid::parse_str(&name).is_ok());

        let name = storage_file_name("");
        assert!(Uuid::parse_str(&name).is_ok());
    }

    #[test]
    fn path_components_are_dropped() {
        let name = storage_file_name("../../etc/passwd.png");
        assert!(!name.contains('/'));
    }
}
