use std::path::Path;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{error, info};

use super::payload::{is_accepted_status, MultipartPayload};
use crate::config::DeliveryConfig;
use crate::error::DeliveryError;

/// Uploads a finished recording
#[async_trait::async_trait]
pub trait DeliveryAgent: Send + Sync {
    async fn deliver(&self, path: &Path) -> Result<(), DeliveryError>;
}

/// Posts the recording to a webhook as a multipart upload
pub struct WebhookDelivery {
    client: Client,
    endpoint: String,
    boundary: String,
    filename: String,
}

impl WebhookDelivery {
    pub fn new(config: &DeliveryConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::with_client(client, config))
    }

    /// Use a preconfigured client; its own timeout and proxy settings apply.
    pub fn with_client(client: Client, config: &DeliveryConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            boundary: config.boundary.clone(),
            filename: config.filename.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl DeliveryAgent for WebhookDelivery {
    async fn deliver(&self, path: &Path) -> Result<(), DeliveryError> {
        if self.endpoint.is_empty() {
            return Err(DeliveryError::NotConfigured);
        }

        let file_bytes = tokio::fs::read(path)
            .await
            .map_err(|source| DeliveryError::MissingFile {
                path: path.to_path_buf(),
                source,
            })?;

        let payload = MultipartPayload::wrap(&self.boundary, &self.filename, &file_bytes);
        drop(file_bytes);

        info!("Posting {} byte payload", payload.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, payload.content_type())
            .body(payload.into_body())
            .send()
            .await
            .map_err(|e| {
                error!("Upload transport error: {}", e);
                DeliveryError::Transport(e)
            })?;

        let status = response.status().as_u16();
        info!("Endpoint answered {}", status);

        if is_accepted_status(status) {
            Ok(())
        } else {
            Err(DeliveryError::Status(status))
        }
    }
}
