use std::time::Duration;

use async_trait::async_trait;
use listing_core::{
    AssetKind, AssetUploader, ServiceError, TrailerUpload, UploadFile, UploadedAsset,
    VersionTransport,
};
use log::{debug, info};
use reqwest::header::{CONTENT_TYPE, COOKIE};
use serde::Deserialize;
use serde_json::Value;

use crate::response::{ensure_success, rejection_messages, unwrap_envelope};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ORIGINAL_FILENAME: &str = "X-Original-Filename";

/// Where and as whom the client talks to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub service_base_url: String,
    pub upload_base_url: String,
    pub app_id: String,
    pub session_cookie: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetResponse {
    token: String,
    #[serde(default, alias = "type")]
    content_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ServiceClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(format!("listing/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::network_request_from("build HTTP client", e))?;

        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn version_url(&self, version_id: &str) -> String {
        format!(
            "{}/apps/{}/versions/{version_id}",
            self.config.service_base_url.trim_end_matches('/'),
            self.config.app_id
        )
    }

    fn upload_url(&self, kind: &str) -> String {
        format!(
            "{}/upload/{kind}",
            self.config.upload_base_url.trim_end_matches('/')
        )
    }

    fn with_session(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.session_cookie {
            Some(cookie) => request.header(COOKIE, cookie),
            None => request,
        }
    }

    async fn upload(
        &self,
        operation: &'static str,
        kind: &str,
        file: &UploadFile,
    ) -> Result<reqwest::Response, ServiceError> {
        let url = self.upload_url(kind);
        debug!(
            "Uploading {} ({} bytes) to {url}",
            file.file_name,
            file.bytes.len()
        );

        let request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, file.content_type)
            .header(ORIGINAL_FILENAME, &file.file_name)
            .body(file.bytes.clone());

        let response = self
            .with_session(request)
            .send()
            .await
            .map_err(|e| ServiceError::network_request_from(operation, e))?;

        ensure_success(operation, response).await
    }
}

/// Path segment an asset of `kind` is uploaded under.
fn upload_kind(kind: AssetKind) -> String {
    match kind {
        AssetKind::Screenshot { device } => format!("screenshot/{device}"),
        AssetKind::TrailerPreview { device } => format!("trailer-preview/{device}"),
        AssetKind::LargeIcon => "large-icon".to_string(),
        AssetKind::WatchIcon => "watch-icon".to_string(),
        AssetKind::TransitFile => "transit-file".to_string(),
    }
}

#[async_trait]
impl VersionTransport for ServiceClient {
    async fn fetch_version(&self, version_id: &str) -> Result<Value, ServiceError> {
        const OPERATION: &str = "fetch version";
        let url = self.version_url(version_id);
        debug!("Fetching {url}");

        let response = self
            .with_session(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ServiceError::network_request_from(OPERATION, e))?;
        let body: Value = ensure_success(OPERATION, response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::network_parse_from(OPERATION, e))?;

        Ok(unwrap_envelope(body))
    }

    async fn update_version(&self, version_id: &str, document: &Value) -> Result<(), ServiceError> {
        const OPERATION: &str = "update version";
        let url = self.version_url(version_id);
        debug!("Posting version document to {url}");

        let response = self
            .with_session(self.client.post(&url).json(document))
            .send()
            .await
            .map_err(|e| ServiceError::network_request_from(OPERATION, e))?;
        let text = ensure_success(OPERATION, response)
            .await?
            .text()
            .await
            .map_err(|e| ServiceError::network_parse_from(OPERATION, e))?;

        if !text.trim().is_empty() {
            let body: Value = serde_json::from_str(&text)
                .map_err(|e| ServiceError::network_parse_from(OPERATION, e))?;
            let messages = rejection_messages(&body);
            if !messages.is_empty() {
                return Err(ServiceError::Rejected {
                    operation: OPERATION,
                    details: messages.join("; "),
                });
            }
        }

        info!("Version {version_id} accepted by the service");
        Ok(())
    }
}

#[async_trait]
impl AssetUploader for ServiceClient {
    async fn upload_asset(
        &self,
        file: &UploadFile,
        kind: AssetKind,
    ) -> Result<UploadedAsset, ServiceError> {
        const OPERATION: &str = "upload asset";
        let asset: AssetResponse = self
            .upload(OPERATION, &upload_kind(kind), file)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::network_parse_from(OPERATION, e))?;

        Ok(UploadedAsset {
            token: asset.token,
            content_type: asset.content_type,
        })
    }

    async fn upload_trailer(&self, file: &UploadFile) -> Result<TrailerUpload, ServiceError> {
        const OPERATION: &str = "upload trailer";
        self.upload(OPERATION, "trailer", file)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::network_parse_from(OPERATION, e))
    }
}
