//! Export job pipeline for geoport.
//!
//! This crate runs export jobs and tracks their lifecycle:
//!
//! - [`JobManager`] - Owns the job registry and dispatches executors
//! - [`JobExecutor`] - Runs the fetch and encode stages of one job
//! - [`JobEvent`] - Progress and terminal events emitted by executors
//! - [`Job`] - One export request and its tracked state
//! - [`DirectorySink`] - Saves completed artifacts to disk

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/geoport/geoport/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod event;
mod executor;
mod job;
mod manager;
mod registry;
mod reporter;
mod sink;

pub use event::JobEvent;
pub use executor::{COMPLETED_MESSAGE, JobExecutor};
pub use job::{Job, JobId, JobStatus};
pub use manager::{JobManager, ManagerConfig, ManagerError};
pub use registry::JobRegistry;
pub use reporter::ProgressReporter;
pub use sink::{ArtifactSink, DirectorySink, SinkError};
