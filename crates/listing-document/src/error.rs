use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Missing segment `{segment}` in document path `{path}`")]
    MissingSegment { path: String, segment: String },

    #[error("Segment `{segment}` in document path `{path}` is not a map")]
    NotAMap { path: String, segment: String },

    #[error("Expected {expected} at `{path}`")]
    InvalidField {
        path: String,
        expected: &'static str,
    },
}

impl DocumentError {
    pub fn missing(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::MissingSegment {
            path: path.into(),
            segment: segment.into(),
        }
    }

    pub fn not_a_map(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::NotAMap {
            path: path.into(),
            segment: segment.into(),
        }
    }

    pub fn invalid(path: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidField {
            path: path.into(),
            expected,
        }
    }

    /// The full path the error was raised for.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::MissingSegment { path, .. }
            | Self::NotAMap { path, .. }
            | Self::InvalidField { path, .. } => path,
        }
    }
}
