//! Export geospatial layers from feature services.
//!
//! This is a facade crate that re-exports functionality from the geoport
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```no_run
//! use geoport_lib::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut manager = JobManager::new(ManagerConfig::default())?;
//!     let sink = DirectorySink::with_default_dir()?;
//!
//!     let request = JobRequest::new(
//!         "topp:states",
//!         ExportFormat::Package,
//!         "https://example.com/geoserver/wfs",
//!     )?;
//!     manager.submit(request);
//!
//!     while let Some(event) = manager.next_update().await {
//!         match event {
//!             JobEvent::Completed { payload, filename, .. } => {
//!                 println!("saved {}", sink.save(&filename, &payload)?.display());
//!             }
//!             JobEvent::Failed { message, .. } => eprintln!("{message}"),
//!             JobEvent::Progress { percent, message, .. } => println!("{percent}% {message}"),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/geoport/geoport/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use geoport_types::*;

// Re-export fetch functionality
#[cfg(feature = "fetch")]
pub use geoport_fetch::{FeatureClient, FetchConfig, FetchError, download_percent, feature_query_url};

// Re-export encoders
#[cfg(feature = "format")]
pub use geoport_format::{
    Encoder, FormatError, GeoJsonEncoder, KmlEncoder, ShapeCategory, ShapefileEncoder,
    encode_collection, escape_xml,
};

// Re-export the job pipeline
#[cfg(feature = "jobs")]
pub use geoport_jobs::{
    ArtifactSink, COMPLETED_MESSAGE, DirectorySink, Job, JobEvent, JobExecutor, JobId, JobManager,
    JobRegistry, JobStatus, ManagerConfig, ManagerError, ProgressReporter, SinkError,
};

/// Prelude module for convenient imports.
///
/// ```
/// use geoport_lib::prelude::*;
/// ```
pub mod prelude {
    pub use geoport_types::{
        ExportError, ExportFormat, Feature, FeatureCollection, Geometry, JobRequest, Properties,
    };

    #[cfg(feature = "fetch")]
    pub use geoport_fetch::{FeatureClient, FetchConfig};

    #[cfg(feature = "format")]
    pub use geoport_format::{
        Encoder, GeoJsonEncoder, KmlEncoder, ShapefileEncoder, encode_collection,
    };

    #[cfg(feature = "jobs")]
    pub use geoport_jobs::{
        ArtifactSink, DirectorySink, JobEvent, JobId, JobManager, JobStatus, ManagerConfig,
    };
}
