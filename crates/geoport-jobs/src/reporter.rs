//! Per-job event emission.

use crate::{JobEvent, JobId};
use bytes::Bytes;
use tokio::sync::mpsc::UnboundedSender;

/// Sends one job's events to the manager.
///
/// Progress is clamped so the emitted sequence never decreases, and the
/// terminal methods consume the reporter so nothing can follow them.
#[derive(Debug)]
pub struct ProgressReporter {
    job_id: JobId,
    last_percent: Option<u8>,
    last_message: String,
    events: UnboundedSender<JobEvent>,
}

impl ProgressReporter {
    /// Creates a reporter for a job.
    #[must_use]
    pub const fn new(job_id: JobId, events: UnboundedSender<JobEvent>) -> Self {
        Self {
            job_id,
            last_percent: None,
            last_message: String::new(),
            events,
        }
    }

    /// Returns the last emitted percentage, 0 before the first report.
    #[must_use]
    pub fn last(&self) -> u8 {
        self.last_percent.unwrap_or(0)
    }

    /// Emits a progress event at `max(last, percent)`.
    ///
    /// An update identical to the previous one is not re-sent.
    pub fn report(&mut self, percent: u8, message: &str) {
        let percent = self.last().max(percent.min(100));
        if self.last_percent == Some(percent) && self.last_message == message {
            return;
        }
        self.last_percent = Some(percent);
        message.clone_into(&mut self.last_message);
        self.send(JobEvent::Progress {
            job_id: self.job_id,
            percent,
            message: message.to_string(),
        });
    }

    /// Emits the terminal success event.
    pub fn complete(self, payload: Bytes, filename: String, message: String) {
        self.send(JobEvent::Completed {
            job_id: self.job_id,
            payload,
            filename,
            message,
        });
    }

    /// Emits the terminal failure event.
    pub fn fail(self, message: String) {
        self.send(JobEvent::Failed {
            job_id: self.job_id,
            message,
        });
    }

    fn send(&self, event: JobEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!(job_id = self.job_id, "Job manager dropped; discarding event");
        }
    }
}
