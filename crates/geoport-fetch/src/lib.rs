//! Streaming feature service client for the geoport layer export pipeline.
//!
//! This crate provides the fetch stage of an export job:
//!
//! - [`query::feature_query_url`] - Builds the GetFeature request URL
//! - [`FeatureClient`] - HTTP client that streams the response body
//! - [`progress::download_percent`] - Maps download progress onto job progress

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/geoport/geoport/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
pub mod progress;
pub mod query;

pub use client::{FeatureClient, FetchConfig, FetchError};
pub use progress::download_percent;
pub use query::feature_query_url;
