//! Export format identifiers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Target format of an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// The feature collection as fetched (GeoJSON).
    #[default]
    Raw,
    /// Earth-browser markup (KML).
    Markup,
    /// Zipped ESRI shapefile set.
    Package,
}

impl ExportFormat {
    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Raw => "geojson",
            Self::Markup => "kml",
            Self::Package => "zip",
        }
    }

    /// Returns the format as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Markup => "markup",
            Self::Package => "package",
        }
    }

    /// Returns the human-readable format name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Raw => "GeoJSON",
            Self::Markup => "KML",
            Self::Package => "Shapefile",
        }
    }

    /// Returns the alternative names accepted by [`FromStr`].
    #[must_use]
    pub const fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Raw => &["geojson", "json"],
            Self::Markup => &["kml"],
            Self::Package => &["shapefile", "shp", "zip"],
        }
    }

    /// Returns the MIME type of the encoded payload.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Raw => "application/geo+json",
            Self::Markup => "application/vnd.google-earth.kml+xml",
            Self::Package => "application/zip",
        }
    }

    /// Returns all available formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Raw, Self::Markup, Self::Package]
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown format name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown format: {0} (expected raw, markup or package)")]
pub struct FormatParseError(pub String);

impl FromStr for ExportFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|format| format.as_str() == lower || format.aliases().contains(&lower.as_str()))
            .ok_or_else(|| FormatParseError(s.to_string()))
    }
}
