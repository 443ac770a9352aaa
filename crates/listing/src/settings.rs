use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use listing_client::ClientConfig;

use crate::error::AppError;

pub const SESSION_COOKIE_ENV: &str = "LISTING_SESSION_COOKIE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub service_base_url: Option<String>,

    #[serde(default)]
    pub upload_base_url: Option<String>,

    #[serde(default)]
    pub app_id: Option<String>,

    #[serde(default)]
    pub session_cookie: Option<String>,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,

    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
}

fn default_http_timeout() -> u64 {
    30
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_base_url: None,
            upload_base_url: None,
            app_id: None,
            session_cookie: None,
            http_timeout_secs: default_http_timeout(),
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
        }
    }
}

impl Settings {
    /// Read settings from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed, so
    /// the caller can warn before falling back to the defaults.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| AppError::read(path, e))?;
        serde_json::from_str(&content).map_err(|e| AppError::parse(path, e))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::write(path, e))?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|e| AppError::parse(path, e))?;
        std::fs::write(path, content).map_err(|e| AppError::write(path, e))
    }

    /// Apply environment overrides; `lookup` is `std::env::var` outside tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(cookie) = lookup(SESSION_COOKIE_ENV).filter(|cookie| !cookie.is_empty()) {
            self.session_cookie = Some(cookie);
        }
    }

    pub fn client_config(&self) -> Result<ClientConfig, AppError> {
        let service_base_url = self
            .service_base_url
            .clone()
            .ok_or(AppError::MissingSetting("service_base_url"))?;
        let app_id = self
            .app_id
            .clone()
            .ok_or(AppError::MissingSetting("app_id"))?;

        Ok(ClientConfig {
            upload_base_url: self
                .upload_base_url
                .clone()
                .unwrap_or_else(|| service_base_url.clone()),
            service_base_url,
            app_id,
            session_cookie: self.session_cookie.clone(),
            timeout: Duration::from_secs(self.http_timeout_secs),
        })
    }
}
