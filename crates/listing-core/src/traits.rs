use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::device::{Device, Resolution};
use crate::error::{MediaError, ServiceError};

/// What an uploaded asset is for; the service routes uploads by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Screenshot { device: Device },
    TrailerPreview { device: Device },
    LargeIcon,
    WatchIcon,
    TransitFile,
}

impl AssetKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Screenshot { .. } => "screenshot",
            Self::TrailerPreview { .. } => "trailer preview",
            Self::LargeIcon => "large app icon",
            Self::WatchIcon => "watch app icon",
            Self::TransitFile => "transit app file",
        }
    }
}

/// A local file read into memory for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub path: PathBuf,
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub async fn read(path: &Path) -> Result<Self, ServiceError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            content_type: content_type_for(path),
            file_name,
            bytes,
        })
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "mov" => "video/quicktime",
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "geojson" | "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub token: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrailerUpload {
    pub responses: Vec<TrailerUploadResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailerUploadResponse {
    pub token: String,
    pub description_doc: String,
}

#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload_asset(
        &self,
        file: &UploadFile,
        kind: AssetKind,
    ) -> Result<UploadedAsset, ServiceError>;

    async fn upload_trailer(&self, file: &UploadFile) -> Result<TrailerUpload, ServiceError>;
}

#[async_trait]
pub trait MediaUtility: Send + Sync {
    /// Grab one frame of `video` at `timestamp` (`MM.SS`) scaled to
    /// `resolution`, returning the path of the written image.
    async fn extract_preview_frame(
        &self,
        video: &Path,
        timestamp: &str,
        resolution: Resolution,
    ) -> Result<PathBuf, MediaError>;

    async fn resolution(&self, path: &Path) -> Result<Resolution, MediaError>;

    async fn is_portrait(&self, path: &Path) -> Result<bool, MediaError> {
        Ok(self.resolution(path).await?.is_portrait())
    }
}

#[async_trait]
pub trait VersionTransport: Send + Sync {
    async fn fetch_version(&self, version_id: &str) -> Result<Value, ServiceError>;

    async fn update_version(&self, version_id: &str, document: &Value)
    -> Result<(), ServiceError>;
}
