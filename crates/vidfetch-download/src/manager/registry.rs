//! Job registry: every submitted job, in submission order.
//!
//! Entries are shared (`Arc`) between the registry, the job queue and the
//! worker running them. Run state sits behind a short-lived sync mutex so
//! the caller, the workers and the engine's progress hook can all touch it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use vidfetch_core::{JobId, JobOptions, JobSnapshot, JobStatus, RecordId};

/// Mutable run state of a job.
#[derive(Debug, Default)]
struct RunState {
    status: JobStatus,
    progress: u64,
    record_id: Option<RecordId>,
    error: Option<String>,
}

/// A registered job.
#[derive(Debug)]
pub struct JobEntry {
    pub id: JobId,
    pub url: String,
    pub options: JobOptions,
    /// Set once, never reset.
    pub cancel: CancellationToken,
    state: Mutex<RunState>,
}

impl JobEntry {
    pub fn new(url: impl Into<String>, options: JobOptions) -> Self {
        Self {
            id: JobId::new(),
            url: url.into(),
            options,
            cancel: CancellationToken::new(),
            state: Mutex::new(RunState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> JobStatus {
        self.state().status
    }

    /// Attach the history record and move a dequeued job to `downloading`.
    ///
    /// The record is kept either way. Returns `false`, leaving the status
    /// alone, if cancellation was already requested or the job is not
    /// `queued`.
    pub fn begin(&self, record_id: Option<RecordId>) -> bool {
        let mut state = self.state();
        state.record_id = record_id;
        if state.status != JobStatus::Queued || self.cancel.is_cancelled() {
            return false;
        }
        state.status = JobStatus::Downloading;
        state.progress = 0;
        true
    }

    /// Request cancellation. No-op once the job is terminal.
    pub fn request_cancel(&self) -> bool {
        let state = self.state();
        if state.status.is_terminal() || self.cancel.is_cancelled() {
            return false;
        }
        self.cancel.cancel();
        true
    }

    pub fn set_progress(&self, percent: u64) {
        self.state().progress = percent;
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.state().record_id
    }

    /// Record the terminal outcome. Only the first call has any effect.
    pub fn finish(&self, status: JobStatus, error: Option<String>) -> bool {
        let mut state = self.state();
        if state.status.is_terminal() {
            return false;
        }
        state.status = status;
        state.error = error;
        true
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let state = self.state();
        JobSnapshot {
            id: self.id,
            url: self.url.clone(),
            options: self.options.clone(),
            status: state.status,
            progress: state.progress,
            record_id: state.record_id,
            error: state.error.clone(),
            cancel_requested: self.cancel.is_cancelled(),
        }
    }
}

/// All jobs known to a manager, keyed by id in submission order.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<IndexMap<JobId, Arc<JobEntry>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, IndexMap<JobId, Arc<JobEntry>>> {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, IndexMap<JobId, Arc<JobEntry>>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, entry: Arc<JobEntry>) {
        self.write().insert(entry.id, entry);
    }

    pub fn get(&self, id: &JobId) -> Option<Arc<JobEntry>> {
        self.read().get(id).cloned()
    }

    pub fn snapshots(&self) -> Vec<JobSnapshot> {
        self.read().values().map(|entry| entry.snapshot()).collect()
    }

    /// Jobs still `queued`, in submission order.
    pub fn queued(&self) -> Vec<Arc<JobEntry>> {
        self.read()
            .values()
            .filter(|entry| entry.status() == JobStatus::Queued)
            .cloned()
            .collect()
    }

    /// Request cancellation of every non-terminal job.
    pub fn cancel_all(&self) -> usize {
        self.read()
            .values()
            .filter(|entry| entry.request_cancel())
            .count()
    }

    /// Drop terminal jobs, keeping the order of the rest.
    pub fn clear_finished(&self) -> usize {
        let mut jobs = self.write();
        let before = jobs.len();
        jobs.retain(|_, entry| !entry.status().is_terminal());
        before - jobs.len()
    }
}
