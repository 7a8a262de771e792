//! GeoJSON output format.

use geoport_types::{DecodeError, ExportFormat, FeatureCollection};
use std::io::Write;

use crate::{Encoder, FormatError};

/// GeoJSON encoder.
///
/// The collection is written back as it was decoded, including members
/// geoport does not interpret.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonEncoder {
    /// Whether to pretty-print.
    pretty: bool,
}

impl GeoJsonEncoder {
    /// Creates a new compact GeoJSON encoder.
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: false }
    }

    /// Sets whether to pretty-print output.
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Decodes GeoJSON bytes, accepting only a well-formed feature collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a JSON object with a
    /// `features` array.
    pub fn decode(&self, bytes: &[u8]) -> Result<FeatureCollection, DecodeError> {
        FeatureCollection::from_slice(bytes)
    }
}

impl Encoder for GeoJsonEncoder {
    fn write_collection<W: Write + Send>(
        &self,
        collection: &FeatureCollection,
        mut writer: W,
    ) -> Result<(), FormatError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, collection)?;
        } else {
            serde_json::to_writer(&mut writer, collection)?;
        }
        Ok(())
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Raw
    }
}
