//! In-memory job registry.

use crate::{Job, JobId};
use std::collections::VecDeque;

/// Ordered collection of jobs, newest first.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: VecDeque<Job>,
}

impl JobRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            jobs: VecDeque::new(),
        }
    }

    /// Inserts a job at the front.
    pub fn insert(&mut self, job: Job) {
        self.jobs.push_front(job);
    }

    /// Returns a job by id.
    #[must_use]
    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == id)
    }

    /// Returns a mutable job by id.
    pub fn get_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|job| job.id == id)
    }

    /// Removes and returns a job by id.
    pub fn remove(&mut self, id: JobId) -> Option<Job> {
        let index = self.jobs.iter().position(|job| job.id == id)?;
        self.jobs.remove(index)
    }

    /// Removes every job.
    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    /// Iterates over jobs, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Returns the number of jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns true if the registry holds no jobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
