use bytes::Bytes;
use reqwest::Client;

use masthead_types::api::AssetUploadResponse;

use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// Client for the third-party asset host. Uploads are real; deletion is a
/// documented no-op because the host offers no delete-by-id guarantee.
#[derive(Clone)]
pub struct AssetClient {
    http: Client,
    base_url: String,
}

impl AssetClient {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.asset_base_url.clone(),
        }
    }

    /// Upload one file, returning the public URL the host assigned.
    pub async fn upload(&self, filename: &str, bytes: Bytes) -> Result<String, GatewayError> {
        let resp = self
            .http
            .post(format!("{}/upload/{}", self.base_url, filename))
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status.as_u16(), message));
        }

        let parsed: AssetUploadResponse = resp.json().await?;
        Ok(parsed.url)
    }

    /// The host does not promise deletion; orphaned assets are tolerated.
    pub async fn delete(&self, url: &str) -> Result<(), GatewayError> {
        tracing::debug!(%url, "asset delete requested; host treats this as a no-op");
        Ok(())
    }
}
