use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use url::Url;

use crate::{errors::AppError, storage::FileStorage};

/// Stores uploads on the local filesystem; they are served back under
/// `/uploads/{file_name}`.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
    public_base_url: Url,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Result<Self, AppError> {
        let mut base = public_base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let public_base_url = Url::parse(&base)
            .map_err(|e| AppError::InvalidInput(format!("Invalid public base URL {}: {}", base, e)))?;

        Ok(LocalFileStorage {
            root: root.into(),
            public_base_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a stored file name to its path, refusing anything that
    /// would leave the upload directory.
    pub fn path_for(&self, file_name: &str) -> Option<PathBuf> {
        let valid = !file_name.is_empty()
            && !file_name.starts_with('.')
            && file_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_');

        valid.then(|| self.root.join(file_name))
    }

    /// Dot-prefixed sibling holding the declared content type. Never
    /// reachable through `path_for`, so it cannot be served or overwritten.
    fn content_type_path(&self, file_name: &str) -> Option<PathBuf> {
        self.path_for(file_name)?;
        Some(self.root.join(format!(".{}.type", file_name)))
    }

    pub async fn read(&self, file_name: &str) -> Option<LocalObject> {
        let path = self.path_for(file_name)?;
        let bytes = fs::read(path).await.ok()?;

        let content_type = match self.content_type_path(file_name) {
            Some(type_path) => fs::read_to_string(type_path)
                .await
                .ok()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            None => None,
        };

        Some(LocalObject { bytes, content_type })
    }
}

/// A stored file with the content type declared at upload time, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn upload(&self, bytes: &[u8], file_name: &str, content_type: &str) -> Result<String, AppError> {
        let path = self
            .path_for(file_name)
            .ok_or_else(|| AppError::upload(format!("invalid file name: {}", file_name)))?;

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::upload(format!("unable to create upload directory: {}", e)))?;

        fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::upload(format!("unable to write {}: {}", file_name, e)))?;

        let content_type = content_type.trim();
        if !content_type.is_empty() {
            if let Some(type_path) = self.content_type_path(file_name) {
                fs::write(type_path, content_type)
                    .await
                    .map_err(|e| AppError::upload(format!("unable to write {}: {}", file_name, e)))?;
            }
        }

        tracing::info!(file = %file_name, size = bytes.len(), "stored upload on local disk");
        Ok(file_name.to_string())
    }

    fn public_url(&self, storage_path: &str) -> String {
        let encoded = urlencoding::encode(storage_path);
        self.public_base_url
            .join(&encoded)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}{}", self.public_base_url, encoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_writes_file_and_builds_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), "http://localhost:8080/uploads").unwrap();

        let path = storage.upload(b"GIF89a", "abc.gif", "image/gif").await.unwrap();

        assert_eq!(path, "abc.gif");
        let stored = storage.read("abc.gif").await.unwrap();
        assert_eq!(stored.bytes, b"GIF89a");
        assert_eq!(stored.content_type.as_deref(), Some("image/gif"));
        assert_eq!(storage.public_url(&path), "http://localhost:8080/uploads/abc.gif");
    }

    #[tokio::test]
    async fn rejects_traversal_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), "http://localhost:8080/uploads/").unwrap();

        let err = storage.upload(b"x", "../escape.png", "image/png").await.unwrap_err();

        assert!(matches!(err, AppError::Upload(_)));
        assert!(storage.read("../escape.png").await.is_none());
    }

    #[tokio::test]
    async fn keeps_declared_type_for_unsniffable_formats() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), "http://localhost:8080/uploads/").unwrap();

        storage
            .upload(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>", "logo.svg", "image/svg+xml")
            .await
            .unwrap();

        let stored = storage.read("logo.svg").await.unwrap();
        assert_eq!(stored.content_type.as_deref(), Some("image/svg+xml"));
        assert!(storage.read(".logo.svg.type").await.is_none());
    }
}
