//! Core types for the geoport layer export pipeline.
//!
//! This crate provides the fundamental data structures used throughout geoport:
//!
//! - [`JobRequest`] - Layer, target format and source endpoint of one export
//! - [`ExportFormat`] - Supported export targets
//! - [`FeatureCollection`] - Decoded GeoJSON feature collection
//! - [`ExportError`] - Stage-tagged export failures
//! - [`export_filename`] - Download filename derived from a layer identifier

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/geoport/geoport/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod feature;
mod filename;
mod format;
mod request;

pub use error::{DecodeError, ExportError, RequestError, Result};
pub use feature::{Feature, FeatureCollection, Geometry, GeometryValue, Position, Properties};
pub use filename::{MAX_FILENAME_STEM, export_filename, sanitize_layer_name};
pub use format::{ExportFormat, FormatParseError};
pub use request::JobRequest;
