//! Encoder abstraction.

use crate::{GeoJsonEncoder, KmlEncoder, ShapefileEncoder};
use geoport_types::{ExportFormat, FeatureCollection};
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during encoding.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Zip archive error.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A geometry cannot be represented in the target format.
    #[error("invalid geometry in feature {feature}: {reason}")]
    InvalidGeometry {
        /// Zero-based index of the offending feature.
        feature: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// The collection has nothing the target format can hold.
    #[error("no point, line or polygon geometries to export")]
    NoGeometry,

    /// The attribute table exceeds the limits of the target format.
    #[error("attribute table error: {0}")]
    Attributes(String),
}

/// Trait for export encoders.
pub trait Encoder: Send + Sync {
    /// Writes the encoded collection to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be encoded or writing fails.
    fn write_collection<W: Write + Send>(
        &self,
        collection: &FeatureCollection,
        writer: W,
    ) -> Result<(), FormatError>;

    /// Returns the format this encoder produces.
    fn format(&self) -> ExportFormat;

    /// Encodes the collection into a byte buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be encoded.
    fn encode(&self, collection: &FeatureCollection) -> Result<Vec<u8>, FormatError> {
        let mut buffer = Vec::new();
        self.write_collection(collection, &mut buffer)?;
        Ok(buffer)
    }

    /// Returns the file extension for this format.
    fn extension(&self) -> &str {
        self.format().extension()
    }
}

/// Encodes a layer's collection in the given format.
///
/// `layer` names the KML document; the other formats ignore it.
///
/// # Errors
///
/// Returns an error if the collection cannot be encoded.
pub fn encode_collection(
    format: ExportFormat,
    layer: &str,
    collection: &FeatureCollection,
) -> Result<Vec<u8>, FormatError> {
    match format {
        ExportFormat::Raw => GeoJsonEncoder::new().encode(collection),
        ExportFormat::Markup => KmlEncoder::new()
            .with_document_name(layer)
            .encode(collection),
        ExportFormat::Package => ShapefileEncoder::new().encode(collection),
    }
}
