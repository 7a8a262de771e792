//! Export job definitions and types.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use geoport_types::JobRequest;
use serde::{Deserialize, Serialize};

/// Identifier of an export job, unique for the process lifetime.
pub type JobId = u64;

/// Status of an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted but not yet dispatched.
    #[default]
    Queued,
    /// Fetching or encoding.
    Processing,
    /// Finished with a payload.
    Completed,
    /// Finished without a payload, including cancellation.
    Failed,
}

impl JobStatus {
    /// Returns true if the job is in a terminal state.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns the status as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One export request and its tracked lifecycle.
///
/// Jobs are owned by the [`JobManager`](crate::JobManager); callers only
/// ever see shared references.
#[derive(Debug, Clone)]
pub struct Job {
    /// Unique identifier for this job.
    pub id: JobId,
    /// The request this job was created from.
    pub request: JobRequest,
    /// Current status.
    pub status: JobStatus,
    /// Progress percentage, non-decreasing while processing.
    pub progress: u8,
    /// Last human-readable status message.
    pub status_message: String,
    /// Encoded artifact, present only once completed.
    pub payload: Option<Bytes>,
    /// Download filename of the artifact.
    pub filename: String,
    /// Timestamp when the job was accepted.
    pub started_at: DateTime<Utc>,
    /// Timestamp of the terminal transition.
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether the user asked for this job to be cancelled.
    pub cancel_requested: bool,
}

impl Job {
    /// Creates a queued job for a request.
    #[must_use]
    pub fn new(id: JobId, request: JobRequest) -> Self {
        let filename = request.filename();
        Self {
            id,
            request,
            status: JobStatus::Queued,
            progress: 0,
            status_message: "Queued".to_string(),
            payload: None,
            filename,
            started_at: Utc::now(),
            completed_at: None,
            cancel_requested: false,
        }
    }

    /// Returns true if the job is in a terminal state.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Marks the job as dispatched to an executor.
    pub fn mark_processing(&mut self) {
        self.status = JobStatus::Processing;
        self.status_message = "Starting export".to_string();
    }

    /// Records a progress update, never moving progress backwards.
    pub fn record_progress(&mut self, percent: u8, message: &str) {
        self.progress = self.progress.max(percent.min(100));
        message.clone_into(&mut self.status_message);
    }

    /// Marks the job as completed with its artifact.
    pub fn mark_completed(&mut self, payload: Bytes, filename: String, message: String) {
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.payload = Some(payload);
        self.filename = filename;
        self.status_message = message;
        self.completed_at = Some(Utc::now());
    }

    /// Marks the job as failed.
    pub fn mark_failed(&mut self, message: String) {
        self.status = JobStatus::Failed;
        self.progress = 0;
        self.payload = None;
        self.status_message = message;
        self.completed_at = Some(Utc::now());
    }
}
