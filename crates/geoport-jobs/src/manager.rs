//! Job registry owner and single writer.

use crate::{Job, JobEvent, JobExecutor, JobId, JobRegistry, JobStatus};
use geoport_fetch::{FeatureClient, FetchConfig, FetchError};
use geoport_types::{ExportError, JobRequest};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Errors returned by [`JobManager`] operations.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// No job with this id is registered.
    #[error("Job not found: {0}")]
    NotFound(JobId),

    /// The job is still processing and must be cancelled first.
    #[error("Job {0} is still processing; cancel it before clearing")]
    JobActive(JobId),

    /// The HTTP client could not be built.
    #[error("Failed to create feature client: {0}")]
    Client(#[source] FetchError),
}

/// Configuration for the job manager.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Fetch settings shared by every job.
    pub fetch: FetchConfig,
    /// Buffered events per subscriber before it starts lagging.
    pub event_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            event_capacity: 256,
        }
    }
}

/// Owns the job registry and dispatches one executor task per job.
///
/// Executors never touch the registry. They send [`JobEvent`]s over a
/// channel and [`next_update`](Self::next_update) applies them one at a
/// time, so every registry mutation goes through `&mut self`.
#[derive(Debug)]
pub struct JobManager {
    registry: JobRegistry,
    executor: Arc<JobExecutor>,
    next_id: JobId,
    tokens: HashMap<JobId, CancellationToken>,
    events_tx: mpsc::UnboundedSender<JobEvent>,
    events_rx: mpsc::UnboundedReceiver<JobEvent>,
    updates: broadcast::Sender<JobEvent>,
    in_flight: usize,
}

impl JobManager {
    /// Creates a manager with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ManagerConfig) -> Result<Self, ManagerError> {
        let client =
            FeatureClient::new(config.fetch).map_err(|e| ManagerError::Client(FetchError::from(e)))?;
        Ok(Self::with_executor(JobExecutor::new(client), config.event_capacity))
    }

    /// Creates a manager around an existing executor.
    #[must_use]
    pub fn with_executor(executor: JobExecutor, event_capacity: usize) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (updates, _) = broadcast::channel(event_capacity.max(1));
        Self {
            registry: JobRegistry::new(),
            executor: Arc::new(executor),
            next_id: 1,
            tokens: HashMap::new(),
            events_tx,
            events_rx,
            updates,
            in_flight: 0,
        }
    }

    /// Registers a job and starts its executor.
    ///
    /// The job is in the registry with status `Processing` before this
    /// returns, so every event it later emits refers to a known id.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn submit(&mut self, request: JobRequest) -> JobId {
        let id = self.next_id;
        self.next_id += 1;

        let mut job = Job::new(id, request.clone());
        job.mark_processing();
        self.registry.insert(job);

        let cancel = CancellationToken::new();
        self.tokens.insert(id, cancel.clone());
        self.in_flight += 1;

        tracing::info!(
            job_id = id,
            layer = request.layer(),
            format = %request.format(),
            "Export submitted"
        );

        let executor = Arc::clone(&self.executor);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            executor.run(id, &request, &cancel, events).await;
        });

        id
    }

    /// Requests cancellation of a job.
    ///
    /// Does nothing if the job already finished. The job becomes `Failed`
    /// once its executor reaches the next checkpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the job is not registered.
    pub fn cancel(&mut self, id: JobId) -> Result<(), ManagerError> {
        let job = self.registry.get_mut(id).ok_or(ManagerError::NotFound(id))?;
        if job.is_finished() {
            return Ok(());
        }

        job.cancel_requested = true;
        job.status_message = "Cancelling".to_string();
        if let Some(token) = self.tokens.get(&id) {
            token.cancel();
        }
        tracing::info!(job_id = id, "Cancellation requested");
        Ok(())
    }

    /// Requests cancellation of every unfinished job.
    pub fn cancel_all(&mut self) {
        let active: Vec<JobId> = self
            .registry
            .iter()
            .filter(|job| !job.is_finished())
            .map(|job| job.id)
            .collect();
        for id in active {
            // Only registered ids are collected above.
            let _ = self.cancel(id);
        }
    }

    /// Removes a finished job from the registry and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::JobActive`] if the job is still processing,
    /// or [`ManagerError::NotFound`] if it is not registered.
    pub fn clear(&mut self, id: JobId) -> Result<Job, ManagerError> {
        let job = self.registry.get(id).ok_or(ManagerError::NotFound(id))?;
        if !job.is_finished() {
            return Err(ManagerError::JobActive(id));
        }
        self.registry.remove(id).ok_or(ManagerError::NotFound(id))
    }

    /// Empties the registry, abandoning jobs that are still processing.
    ///
    /// Abandoned executors are signalled to stop; whatever they emit
    /// afterwards is dropped.
    pub fn clear_all(&mut self) {
        for token in self.tokens.values() {
            token.cancel();
        }
        tracing::info!(jobs = self.registry.len(), "Clearing all jobs");
        self.tokens.clear();
        self.registry.clear();
    }

    /// Waits for the next event and applies it to the registry.
    ///
    /// Returns the applied event, or `None` once no executor is running.
    /// Events from jobs that were cleared are dropped.
    pub async fn next_update(&mut self) -> Option<JobEvent> {
        while self.in_flight > 0 {
            let event = self.events_rx.recv().await?;
            if event.is_terminal() {
                self.in_flight -= 1;
            }
            if let Some(applied) = self.apply(event) {
                // No subscribers is fine.
                let _ = self.updates.send(applied.clone());
                return Some(applied);
            }
        }
        None
    }

    /// Subscribes to every event applied from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.updates.subscribe()
    }

    /// Returns a job by id.
    #[must_use]
    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.registry.get(id)
    }

    /// Iterates over jobs, newest first.
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.registry.iter()
    }

    /// Returns the number of registered jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns true if no jobs are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Returns the number of executors that have not finished yet,
    /// including abandoned ones.
    #[must_use]
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    fn apply(&mut self, event: JobEvent) -> Option<JobEvent> {
        let id = event.job_id();
        let Some(job) = self.registry.get_mut(id) else {
            tracing::debug!(job_id = id, "Dropping event for cleared job");
            return None;
        };
        if job.status != JobStatus::Processing {
            tracing::debug!(job_id = id, status = %job.status, "Dropping event for finished job");
            return None;
        }

        let event = match event {
            JobEvent::Completed { job_id, .. } if job.cancel_requested => JobEvent::Failed {
                job_id,
                message: ExportError::Cancelled.to_string(),
            },
            other => other,
        };

        match &event {
            JobEvent::Progress {
                percent, message, ..
            } => job.record_progress(*percent, message),
            JobEvent::Completed {
                payload,
                filename,
                message,
                ..
            } => {
                job.mark_completed(payload.clone(), filename.clone(), message.clone());
            }
            JobEvent::Failed { message, .. } => {
                job.mark_failed(message.clone());
            }
        }

        if event.is_terminal() {
            self.tokens.remove(&id);
        }
        Some(event)
    }
}
