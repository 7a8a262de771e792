//! Export job requests.

use crate::{ExportFormat, RequestError, export_filename};
use url::Url;

/// Immutable description of one export: which layer, in which format,
/// from which feature service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    layer: String,
    format: ExportFormat,
    endpoint: Url,
}

impl JobRequest {
    /// Creates a new request.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer identifier is blank or the endpoint
    /// is not an absolute http(s) URL.
    pub fn new(
        layer: impl Into<String>,
        format: ExportFormat,
        endpoint: &str,
    ) -> Result<Self, RequestError> {
        let layer = layer.into();
        if layer.trim().is_empty() {
            return Err(RequestError::EmptyLayer);
        }

        let endpoint = Url::parse(endpoint).map_err(|source| RequestError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(RequestError::UnsupportedScheme(endpoint.scheme().to_string()));
        }

        Ok(Self {
            layer,
            format,
            endpoint,
        })
    }

    /// Returns the layer identifier.
    #[must_use]
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Returns the target format.
    #[must_use]
    pub const fn format(&self) -> ExportFormat {
        self.format
    }

    /// Returns the feature service endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the download filename for the finished artifact.
    #[must_use]
    pub fn filename(&self) -> String {
        export_filename(&self.layer, self.format)
    }
}
