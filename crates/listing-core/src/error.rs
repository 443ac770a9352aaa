use listing_document::DocumentError;
use thiserror::Error;

/// Failures raised by [`crate::VersionRecord`] and its views.
///
/// Local validation failures (`InvalidArgument`, `NotFound`, `InvalidState`)
/// are always raised before the document or any collaborator is touched.
/// Collaborator failures pass through untouched in `Service` and `Media`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Invalid {argument} `{value}`: {constraint}")]
    InvalidArgument {
        argument: &'static str,
        value: String,
        constraint: String,
    },

    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(DocumentError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Media(#[from] MediaError),
}

impl RecordError {
    pub fn invalid_argument(
        argument: &'static str,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            argument,
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    pub fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            key: key.into(),
        }
    }

    /// True for failures raised by a collaborator rather than by local checks.
    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self, Self::Service(_) | Self::Media(_))
    }
}

impl From<DocumentError> for RecordError {
    fn from(error: DocumentError) -> Self {
        match error {
            DocumentError::MissingSegment { path, .. } => Self::NotFound {
                what: "Document path",
                key: path,
            },
            other => Self::MalformedDocument(other),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Network error during {operation} ({stage}): {details}")]
    NetworkError {
        operation: &'static str,
        stage: NetworkStage,
        details: String,
    },

    #[error("{operation} failed with HTTP {status}{body_snippet}")]
    HttpStatus {
        operation: &'static str,
        status: u16,
        body_snippet: String,
    },

    #[error("Service rejected {operation}: {details}")]
    Rejected {
        operation: &'static str,
        details: String,
    },

    #[error("IO error ({kind}): {message}")]
    IoError {
        kind: std::io::ErrorKind,
        message: String,
    },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStage {
    #[error("request")]
    Request,
    #[error("response parse")]
    ResponseParse,
}

impl ServiceError {
    pub fn network_request(operation: &'static str, details: impl Into<String>) -> Self {
        Self::NetworkError {
            operation,
            stage: NetworkStage::Request,
            details: details.into(),
        }
    }

    pub fn network_request_from<E>(operation: &'static str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::network_request(operation, error.to_string())
    }

    pub fn network_parse(operation: &'static str, details: impl Into<String>) -> Self {
        Self::NetworkError {
            operation,
            stage: NetworkStage::ResponseParse,
            details: details.into(),
        }
    }

    pub fn network_parse_from<E>(operation: &'static str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::network_parse(operation, error.to_string())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::IoError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("{tool} failed: {details}")]
    ToolFailed { tool: &'static str, details: String },

    #[error("Could not determine resolution of {path}: {details}")]
    UnreadableResolution { path: String, details: String },

    #[error("IO error ({kind}): {message}")]
    IoError {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self {
        MediaError::IoError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
