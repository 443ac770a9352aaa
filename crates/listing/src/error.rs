use std::path::Path;

use listing_core::{MediaError, RecordError, ServiceError};
use listing_platform::AppPathsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Paths(#[from] AppPathsError),

    #[error("Setting `{0}` is not configured")]
    MissingSetting(&'static str),

    #[error("No document given; pass --document <path>")]
    MissingDocument,

    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a valid version document: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AppError {
    pub fn read(path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn write(path: &Path, source: std::io::Error) -> Self {
        Self::Write {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn parse(path: &Path, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.display().to_string(),
            source,
        }
    }

    /// Local validation failures get a distinct exit code from service and
    /// tooling failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Record(error) if error.is_external() => 1,
            Self::Record(_) | Self::MissingSetting(_) | Self::MissingDocument => 2,
            _ => 1,
        }
    }
}
