// crates/server/src/jobs/runner.rs
//! Process-wide job registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use docbridge_core::ConversionKind;

use super::state::EventChannel;
use super::types::{JobId, ProgressEvent};

/// Maps job ids to their event channels.
///
/// Every insert, lookup, and delete goes through one mutex. The lock is never
/// held across an `.await`. Ids are only ever generated here, so a deleted id
/// cannot come back.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<JobId, Arc<EventChannel>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job with an empty channel and return its id.
    pub fn create_job(&self, kind: ConversionKind) -> JobId {
        let mut jobs = self.lock();
        let mut id = JobId::new();
        while jobs.contains_key(&id) {
            id = JobId::new();
        }
        jobs.insert(id, Arc::new(EventChannel::new(kind)));
        tracing::debug!(job_id = %id, kind = %kind, "Job registered");
        id
    }

    /// The job's channel, if the job still exists. Does not remove it.
    pub fn lookup(&self, id: &JobId) -> Option<Arc<EventChannel>> {
        self.lock().get(id).cloned()
    }

    /// Append an event to the job's queue. Events for unknown jobs are
    /// dropped with a warning. Returns whether the job existed.
    pub fn publish(&self, id: &JobId, event: ProgressEvent) -> bool {
        let jobs = self.lock();
        match jobs.get(id) {
            Some(channel) => {
                channel.push(event);
                true
            }
            None => {
                tracing::warn!(job_id = %id, event = ?event, "Dropping event for unknown job");
                false
            }
        }
    }

    /// Remove the job. Idempotent; returns whether it was present.
    pub fn delete(&self, id: &JobId) -> bool {
        let removed = self.lock().remove(id).is_some();
        if removed {
            tracing::debug!(job_id = %id, "Job removed from registry");
        }
        removed
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, Arc<EventChannel>>> {
        self.jobs.lock().unwrap_or_else(|poisoned| {
            tracing::error!("Mutex poisoned on job registry, recovering");
            poisoned.into_inner()
        })
    }
}
