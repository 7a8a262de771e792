//! KML output format.

use geoport_types::{ExportFormat, Feature, FeatureCollection, Geometry, Position};
use serde_json::Value;
use std::borrow::Cow;
use std::io::Write;

use crate::{Encoder, FormatError};

const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Escapes the five XML special characters.
///
/// Text without special characters is returned unchanged, so escaping
/// safe input is idempotent.
///
/// # Example
///
/// ```
/// use geoport_format::escape_xml;
///
/// assert_eq!(escape_xml("A & B"), "A &amp; B");
/// assert_eq!(escape_xml("plain"), "plain");
/// ```
#[must_use]
pub fn escape_xml(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// KML encoder.
///
/// Writes one placemark per feature, in input order. Polygons are written
/// with their outer ring only; geometry types other than Point,
/// LineString, Polygon and MultiPolygon are left out of the placemark.
#[derive(Debug, Clone, Default)]
pub struct KmlEncoder {
    /// Name of the enclosing document.
    document_name: Option<String>,
}

impl KmlEncoder {
    /// Creates a new KML encoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            document_name: None,
        }
    }

    /// Sets the document name, usually the layer identifier.
    #[must_use]
    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = Some(name.into());
        self
    }
}

impl Encoder for KmlEncoder {
    fn write_collection<W: Write + Send>(
        &self,
        collection: &FeatureCollection,
        mut writer: W,
    ) -> Result<(), FormatError> {
        writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(writer, r#"<kml xmlns="{KML_NAMESPACE}">"#)?;
        writeln!(writer, "  <Document>")?;
        if let Some(name) = &self.document_name {
            writeln!(writer, "    <name>{}</name>", escape_xml(name))?;
        }

        for (index, feature) in collection.features.iter().enumerate() {
            write_placemark(&mut writer, index, feature)?;
        }

        writeln!(writer, "  </Document>")?;
        writeln!(writer, "</kml>")?;
        Ok(())
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Markup
    }
}

fn write_placemark<W: Write>(
    writer: &mut W,
    index: usize,
    feature: &Feature,
) -> Result<(), FormatError> {
    writeln!(writer, "    <Placemark>")?;
    writeln!(
        writer,
        "      <name>{}</name>",
        escape_xml(&placemark_name(index, feature))
    )?;

    let description: Vec<String> = feature
        .property_entries()
        .filter(|(key, _)| key.as_str() != "name")
        .map(|(key, value)| {
            format!("{}: {}", escape_xml(key), escape_xml(&value_text(value)))
        })
        .collect();
    if !description.is_empty() {
        writeln!(
            writer,
            "      <description>{}</description>",
            description.join("\n")
        )?;
    }

    match feature.known_geometry() {
        Some(geometry) => write_geometry(writer, index, geometry)?,
        None if feature.geometry.is_some() => {
            tracing::debug!(feature = index, "Omitting unrecognized geometry from placemark");
        }
        None => {}
    }

    writeln!(writer, "    </Placemark>")?;
    Ok(())
}

/// Returns the `name` property, falling back to a 1-based position.
fn placemark_name(index: usize, feature: &Feature) -> String {
    match feature.property("name") {
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        None | Some(Value::Null | Value::String(_)) => format!("Feature {}", index + 1),
        Some(other) => value_text(other),
    }
}

/// Coerces a property value to its display text.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn write_geometry<W: Write>(
    writer: &mut W,
    index: usize,
    geometry: &Geometry,
) -> Result<(), FormatError> {
    match geometry {
        Geometry::Point { coordinates } if coordinates.is_empty() => {
            tracing::debug!(feature = index, "Omitting empty point from placemark");
        }
        Geometry::LineString { coordinates } if coordinates.is_empty() => {
            tracing::debug!(feature = index, "Omitting empty line from placemark");
        }
        Geometry::Point { coordinates } => {
            writeln!(
                writer,
                "      <Point><coordinates>{}</coordinates></Point>",
                coordinate(index, coordinates)?
            )?;
        }
        Geometry::LineString { coordinates } => {
            writeln!(
                writer,
                "      <LineString><coordinates>{}</coordinates></LineString>",
                coordinate_list(index, coordinates)?
            )?;
        }
        Geometry::Polygon { coordinates } => {
            write_polygon(writer, index, coordinates, "      ")?;
        }
        Geometry::MultiPolygon { coordinates } => {
            writeln!(writer, "      <MultiGeometry>")?;
            for polygon in coordinates {
                write_polygon(writer, index, polygon, "        ")?;
            }
            writeln!(writer, "      </MultiGeometry>")?;
        }
        other => {
            tracing::debug!(
                feature = index,
                geometry = other.type_name(),
                "Omitting unsupported geometry type from placemark"
            );
        }
    }
    Ok(())
}

fn write_polygon<W: Write>(
    writer: &mut W,
    index: usize,
    rings: &[Vec<Position>],
    indent: &str,
) -> Result<(), FormatError> {
    let Some(outer) = rings.first() else {
        return Ok(());
    };
    writeln!(
        writer,
        "{indent}<Polygon><outerBoundaryIs><LinearRing><coordinates>{}</coordinates></LinearRing></outerBoundaryIs></Polygon>",
        coordinate_list(index, outer)?
    )?;
    Ok(())
}

/// Formats a position as `x,y,z`, defaulting z to 0.
fn coordinate(index: usize, position: &[f64]) -> Result<String, FormatError> {
    match position {
        [x, y] => Ok(format!("{x},{y},0")),
        [x, y, z, ..] => Ok(format!("{x},{y},{z}")),
        _ => Err(FormatError::InvalidGeometry {
            feature: index,
            reason: format!("position has {} coordinates, expected at least 2", position.len()),
        }),
    }
}

fn coordinate_list(index: usize, positions: &[Position]) -> Result<String, FormatError> {
    let formatted = positions
        .iter()
        .map(|position| coordinate(index, position))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(formatted.join(" "))
}
