//! Events emitted by job executors.

use crate::JobId;
use bytes::Bytes;

/// A status update for one job.
///
/// Executors emit any number of `Progress` events followed by exactly one
/// terminal `Completed` or `Failed` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// The job moved forward.
    Progress {
        /// Job the event belongs to.
        job_id: JobId,
        /// Progress percentage, 0 to 100.
        percent: u8,
        /// Human-readable stage description.
        message: String,
    },
    /// The job produced its artifact.
    Completed {
        /// Job the event belongs to.
        job_id: JobId,
        /// Encoded artifact.
        payload: Bytes,
        /// Download filename of the artifact.
        filename: String,
        /// Human-readable completion message.
        message: String,
    },
    /// The job failed or was cancelled.
    Failed {
        /// Job the event belongs to.
        job_id: JobId,
        /// Human-readable failure message.
        message: String,
    },
}

impl JobEvent {
    /// Returns the id of the job this event belongs to.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        match self {
            Self::Progress { job_id, .. }
            | Self::Completed { job_id, .. }
            | Self::Failed { job_id, .. } => *job_id,
        }
    }

    /// Returns true for `Completed` and `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }

    /// Returns the event message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Progress { message, .. }
            | Self::Completed { message, .. }
            | Self::Failed { message, .. } => message,
        }
    }
}
