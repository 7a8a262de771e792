//! GeoJSON, KML and shapefile encoders for the geoport layer export pipeline.
//!
//! This crate provides encoders for writing feature collections to the
//! supported export formats:
//!
//! - [`GeoJsonEncoder`] - GeoJSON pass-through
//! - [`KmlEncoder`] - KML placemark document
//! - [`ShapefileEncoder`] - Zipped ESRI shapefile sets

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/geoport/geoport/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod encoder;
mod geojson;
mod kml;
mod shapefile;

pub use encoder::{Encoder, FormatError, encode_collection};
pub use geojson::GeoJsonEncoder;
pub use kml::{KmlEncoder, escape_xml};
pub use shapefile::{ShapeCategory, ShapefileEncoder};
