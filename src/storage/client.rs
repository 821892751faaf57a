use super::types::{Garment, UploadRequest, UploadResponse};
use crate::config::StorageConfig;
use crate::error::StorageError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Remote garment storage: upload, list and delete
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadResponse, StorageError>;

    async fn list(&self, user_id: &str) -> Result<Vec<Garment>, StorageError>;

    async fn delete(&self, image_url: &str, user_id: &str) -> Result<(), StorageError>;
}

/// HTTP client for the `/clothes` endpoints
pub struct HttpStorageClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpStorageClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StorageError::Network {
                details: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Self::new(&config.base_url, config.timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn clothes_url(&self) -> String {
        format!("{}/clothes", self.base_url)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!("Storage service responded {}: {}", status, body);
        Err(StorageError::Server {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl StorageService for HttpStorageClient {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadResponse, StorageError> {
        debug!(
            "POST {} (category {}, season {}, {} payload chars)",
            self.clothes_url(),
            request.category,
            request.season,
            request.image_base64.len()
        );

        let response = self
            .client
            .post(self.clothes_url())
            .json(request)
            .send()
            .await
            .map_err(|e| StorageError::Network {
                details: e.to_string(),
            })?;
        let response = Self::check_status(response).await?;

        // Success is decided by status alone; a body we cannot read is not a failure
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<UploadResponse>(&text).unwrap_or_else(|e| {
            debug!("Upload response body not understood ({}); ignoring", e);
            UploadResponse::default()
        });

        info!("Garment uploaded: {}", body.url.as_deref().unwrap_or("<no url>"));
        Ok(body)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Garment>, StorageError> {
        let response = self
            .client
            .get(self.clothes_url())
            .query(&[("user_id", user_id)])
            .send()
            .await
            .map_err(|e| StorageError::Network {
                details: e.to_string(),
            })?;
        let response = Self::check_status(response).await?;

        let garments: Vec<Garment> = response.json().await?;
        debug!("Listed {} garments for user '{}'", garments.len(), user_id);
        Ok(garments)
    }

    async fn delete(&self, image_url: &str, user_id: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .delete(self.clothes_url())
            .query(&[("image_url", image_url), ("user_id", user_id)])
            .send()
            .await
            .map_err(|e| StorageError::Network {
                details: e.to_string(),
            })?;
        Self::check_status(response).await?;

        info!("Deleted garment {}", image_url);
        Ok(())
    }
}
