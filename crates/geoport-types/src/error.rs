//! Error types for geoport.

use crate::ExportFormat;
use thiserror::Error;

/// Result type alias for geoport export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Terminal failure of an export job.
///
/// Every variant collapses onto the single `Failed` job status; the
/// [`Display`](std::fmt::Display) output is the message shown to the user
/// and is prefixed with the stage that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// The feature service could not be reached or answered with a
    /// non-success status.
    #[error("Failed to fetch layer data: {reason}")]
    FetchFailed {
        /// HTTP status code, when the server answered.
        status: Option<u16>,
        /// Human-readable cause.
        reason: String,
    },

    /// The response body is not a feature collection.
    #[error("Failed to parse feature data: {0}")]
    DecodeFailed(String),

    /// The format encoder rejected the collection.
    #[error("Failed to convert to {}: {cause}", .format.label())]
    EncodeFailed {
        /// Target format of the failed conversion.
        format: ExportFormat,
        /// Human-readable cause.
        cause: String,
    },

    /// The user cancelled the job.
    #[error("Export cancelled by user")]
    Cancelled,
}

impl ExportError {
    /// Creates a fetch failure for a non-success HTTP status.
    #[must_use]
    pub fn http_status(status: u16) -> Self {
        Self::FetchFailed {
            status: Some(status),
            reason: format!("server returned HTTP {status}"),
        }
    }

    /// Returns the HTTP status code attached to a fetch failure.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::FetchFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns true if this failure was caused by user cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<DecodeError> for ExportError {
    fn from(err: DecodeError) -> Self {
        Self::DecodeFailed(err.to_string())
    }
}

/// Errors raised while decoding a response body into a feature collection.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The body is not valid UTF-8 text.
    #[error("response is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The body is not valid JSON, or does not match the GeoJSON model.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is valid JSON but not an object.
    #[error("document is not a JSON object")]
    NotAnObject,

    /// The document has no `features` array.
    #[error("document has no `features` array")]
    MissingFeatures,
}

/// Errors raised while building a [`JobRequest`](crate::JobRequest).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The layer identifier is empty or whitespace.
    #[error("layer identifier must not be empty")]
    EmptyLayer,

    /// The source endpoint is not an absolute URL.
    #[error("invalid source endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        /// The rejected endpoint text.
        endpoint: String,
        /// The underlying parse error.
        source: url::ParseError,
    },

    /// The source endpoint uses a scheme other than http or https.
    #[error("unsupported endpoint scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
}
