use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::{errors::AppError, storage::FileStorage};

/// Client for a hosted object-storage REST API (bucket based, bearer key).
#[derive(Clone)]
pub struct RemoteObjectStorage {
    client: Client,
    base_url: String,
    bucket: String,
    api_key: Zeroizing<String>,
}

#[derive(Debug, Deserialize)]
struct StorageErrorBody {
    #[serde(default, alias = "error")]
    message: Option<String>,
}

impl RemoteObjectStorage {
    pub fn new(base_url: &str, bucket: &str, api_key: Zeroizing<String>) -> Self {
        RemoteObjectStorage {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            api_key,
        }
    }

    fn object_url(&self, storage_path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(storage_path)
        )
    }
}

impl std::fmt::Debug for RemoteObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteObjectStorage")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl FileStorage for RemoteObjectStorage {
    async fn upload(&self, bytes: &[u8], file_name: &str, content_type: &str) -> Result<String, AppError> {
        let content_type = content_type_for(bytes, content_type);

        let response = self.client
            .post(self.object_url(file_name))
            .bearer_auth(self.api_key.as_str())
            .header(CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(AppError::upload)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StorageErrorBody>(&text)
                .ok()
                .and_then(|body| body.message)
                .unwrap_or(text);
            tracing::warn!(%status, file = %file_name, "object storage rejected upload");
            return Err(AppError::upload(format!("{} ({})", message, status)));
        }

        tracing::info!(file = %file_name, bucket = %self.bucket, "stored upload in object storage");
        Ok(file_name.to_string())
    }

    fn public_url(&self, storage_path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(storage_path)
        )
    }
}

/// The declared type wins unless it is missing or generic, in which case the
/// bytes are sniffed.
fn content_type_for<'a>(bytes: &[u8], declared: &'a str) -> &'a str {
    let declared = declared.trim();
    if !declared.is_empty() && declared != "application/octet-stream" {
        return declared;
    }
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream")
}
