use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::error::AppError;

const SYSTEM: &str = "object store";

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes under a deterministic key and return the addressable
    /// URL. Re-using a key silently overwrites the previous object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, AppError>;
}

/// Bucket-scoped HTTP object store with bearer-token auth. Uploads go to the
/// API endpoint; returned URLs point at the public base.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    http: reqwest::Client,
    api_url: String,
    public_url: String,
    bucket: String,
    token: String,
}

impl HttpObjectStore {
    pub fn new(api_url: String, public_url: String, bucket: String, token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            public_url,
            bucket,
            token,
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, AppError> {
        let url = format!("{}/{}/{}", self.api_url, self.bucket, key);

        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::upstream(SYSTEM, format!("failed to upload {key}: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::upstream(
                SYSTEM,
                format!("upload of {key} returned {}", response.status()),
            ));
        }

        Ok(format!("{}/{}", self.public_url, key))
    }
}
