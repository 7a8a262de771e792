//! Download filename construction.

use crate::ExportFormat;

/// Maximum number of characters kept from the layer identifier.
pub const MAX_FILENAME_STEM: usize = 180;

/// Characters that are not allowed in filenames on common filesystems.
const UNSAFE_CHARS: &[char] = &[':', '\\', '/', '?', '%', '*', '|', '"', '<', '>'];

/// Sanitizes a layer identifier for use as a filename stem.
///
/// Each filesystem-unsafe character is replaced by `__`, surrounding
/// whitespace is trimmed and the result is capped at
/// [`MAX_FILENAME_STEM`] characters. An identifier that sanitizes to
/// nothing becomes `export`.
///
/// # Example
///
/// ```
/// use geoport_types::sanitize_layer_name;
///
/// assert_eq!(sanitize_layer_name("topp:states"), "topp__states");
/// ```
#[must_use]
pub fn sanitize_layer_name(layer: &str) -> String {
    let replaced: String = layer
        .chars()
        .map(|c| {
            if UNSAFE_CHARS.contains(&c) {
                "__".to_string()
            } else {
                c.to_string()
            }
        })
        .collect();

    let stem: String = replaced.trim().chars().take(MAX_FILENAME_STEM).collect();
    if stem.is_empty() {
        "export".to_string()
    } else {
        stem
    }
}

/// Builds the download filename for a layer exported in the given format.
///
/// # Example
///
/// ```
/// use geoport_types::{ExportFormat, export_filename};
///
/// assert_eq!(export_filename("topp:states", ExportFormat::Markup), "topp__states.kml");
/// ```
#[must_use]
pub fn export_filename(layer: &str, format: ExportFormat) -> String {
    format!("{}.{}", sanitize_layer_name(layer), format.extension())
}
