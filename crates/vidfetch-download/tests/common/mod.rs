//! Test doubles for queue manager integration tests.
//!
//! - `ScriptedEngine`: runs a closure per job and tracks call order and
//!   concurrency
//! - `RecordingHistory`: in-memory history store that logs every call
//! - `EventLog`: emitter port that records events and lets tests wait on them
//! - `Latch`: one-shot gate an engine script can block on

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use vidfetch_core::{
    DownloadEnginePort, EngineError, EngineRequest, HistoryEntry, HistoryRepositoryPort, JobId,
    JobStatus, ProgressHook, ProgressRecord, QueueEvent, QueueEventEmitterPort, RecordId,
    RepositoryError,
};
use vidfetch_download::{QueueManager, QueueManagerConfig, QueueManagerDeps};

pub const TIMEOUT: Duration = Duration::from_secs(10);

// ── Latch ──────────────────────────────────────────────────────────

/// Blocks callers of `wait` until `open` is called.
#[derive(Default)]
pub struct Latch {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Latch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }

    pub fn is_open(&self) -> bool {
        *self.open.lock().unwrap()
    }

    /// Wait up to `timeout`; returns whether the latch is open.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.open.lock().unwrap();
        let (guard, _) = self
            .cv
            .wait_timeout_while(guard, timeout, |open| !*open)
            .unwrap();
        *guard
    }

    /// Open from another thread after `delay`.
    pub fn open_after(self: &Arc<Self>, delay: Duration) -> std::thread::JoinHandle<()> {
        let latch = Arc::clone(self);
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            latch.open();
        })
    }
}

// ── Engine ─────────────────────────────────────────────────────────

type Script = dyn Fn(EngineRequest<'_>, &mut ProgressHook<'_>) -> Result<(), EngineError>
    + Send
    + Sync;

/// Engine whose behaviour is a closure, with call tracking.
pub struct ScriptedEngine {
    script: Box<Script>,
    calls: Mutex<Vec<String>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(EngineRequest<'_>, &mut ProgressHook<'_>) -> Result<(), EngineError>
            + Send
            + Sync
            + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
        })
    }

    /// Reports 50% then finished, and succeeds.
    pub fn succeeding() -> Arc<Self> {
        Self::new(|_, hook| {
            hook(&ProgressRecord::new("downloading", Some(50), Some(100)))?;
            hook(&ProgressRecord::new("finished", Some(100), Some(100)))?;
            Ok(())
        })
    }

    /// Sleeps for `delay` and succeeds.
    pub fn sleeping(delay: Duration) -> Arc<Self> {
        Self::new(move |_, _| {
            std::thread::sleep(delay);
            Ok(())
        })
    }

    /// Blocks on `latch`, then succeeds. Gives up if the job is cancelled.
    pub fn gated(latch: &Arc<Latch>) -> Arc<Self> {
        let latch = Arc::clone(latch);
        Self::new(move |request, _| {
            while !latch.wait_timeout(Duration::from_millis(10)) {
                if request.cancel.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }
            }
            Ok(())
        })
    }

    /// Reports progress every few milliseconds until the hook refuses.
    pub fn until_aborted() -> Arc<Self> {
        Self::new(|_, hook| {
            let mut downloaded = 0;
            loop {
                downloaded += 1;
                hook(&ProgressRecord::new("downloading", Some(downloaded), Some(1_000_000)))?;
                std::thread::sleep(Duration::from_millis(5));
            }
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    pub fn reset_max(&self) {
        self.max_running.store(self.running(), Ordering::SeqCst);
    }
}

impl DownloadEnginePort for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn run(
        &self,
        request: EngineRequest<'_>,
        on_progress: &mut ProgressHook<'_>,
    ) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push(request.url.to_string());
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);

        let result = (self.script)(request, on_progress);

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

// ── History ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryCall {
    Create(String),
    Update(RecordId, JobStatus),
}

/// In-memory history store recording every call.
#[derive(Default)]
pub struct RecordingHistory {
    calls: Mutex<Vec<HistoryCall>>,
    next_id: AtomicI64,
    fail: AtomicBool,
    create_gate: Option<Arc<Latch>>,
}

impl RecordingHistory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every call fails with a storage error.
    pub fn failing() -> Arc<Self> {
        let history = Self::default();
        history.fail.store(true, Ordering::SeqCst);
        Arc::new(history)
    }

    /// `create` logs the call, then does not return until `latch` opens.
    pub fn holding_creates(latch: &Arc<Latch>) -> Arc<Self> {
        Arc::new(Self {
            create_gate: Some(Arc::clone(latch)),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<HistoryCall> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(RepositoryError::Storage("disk on fire".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl HistoryRepositoryPort for RecordingHistory {
    async fn create(&self, url: &str) -> Result<RecordId, RepositoryError> {
        self.calls
            .lock()
            .unwrap()
            .push(HistoryCall::Create(url.to_string()));
        if let Some(latch) = &self.create_gate {
            while !latch.is_open() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
        self.check()?;
        Ok(RecordId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn update_status(&self, id: RecordId, status: JobStatus) -> Result<(), RepositoryError> {
        self.calls
            .lock()
            .unwrap()
            .push(HistoryCall::Update(id, status));
        self.check()
    }

    async fn recent(&self, _limit: u32) -> Result<Vec<HistoryEntry>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn search(&self, _query: &str, _limit: u32) -> Result<Vec<HistoryEntry>, RepositoryError> {
        Ok(Vec::new())
    }
}

// ── Events ─────────────────────────────────────────────────────────

/// Emitter port recording every event in emission order.
#[derive(Clone, Default)]
pub struct EventLog {
    inner: Arc<(Mutex<Vec<QueueEvent>>, Condvar)>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<QueueEvent> {
        self.inner.0.lock().unwrap().clone()
    }

    /// Events of one job, in order.
    pub fn for_job(&self, id: JobId) -> Vec<QueueEvent> {
        self.events().into_iter().filter(|e| e.id() == id).collect()
    }

    /// Wait until `pred` holds over the recorded events.
    pub fn wait_until(&self, pred: impl Fn(&[QueueEvent]) -> bool) -> bool {
        let (lock, cv) = &*self.inner;
        let guard = lock.lock().unwrap();
        let (_guard, result) = cv
            .wait_timeout_while(guard, TIMEOUT, |events| !pred(events))
            .unwrap();
        !result.timed_out()
    }

    /// Wait until every job in `ids` has a terminal event.
    pub fn wait_terminal(&self, ids: &[JobId]) -> bool {
        self.wait_until(|events| {
            ids.iter()
                .all(|id| events.iter().any(|e| e.id() == *id && e.is_terminal()))
        })
    }

    /// Wait until the job has emitted its `downloading` update.
    pub fn wait_started(&self, id: JobId) -> bool {
        self.wait_until(|events| {
            events
                .iter()
                .any(|e| e.id() == id && matches!(e, QueueEvent::JobUpdated { .. }))
        })
    }

    /// Number of terminal events per job.
    pub fn terminal_counts(&self) -> HashMap<JobId, usize> {
        let mut counts = HashMap::new();
        for event in self.events().iter().filter(|e| e.is_terminal()) {
            *counts.entry(event.id()).or_insert(0) += 1;
        }
        counts
    }
}

impl QueueEventEmitterPort for EventLog {
    fn emit(&self, event: QueueEvent) {
        let (lock, cv) = &*self.inner;
        lock.lock().unwrap().push(event);
        cv.notify_all();
    }

    fn clone_box(&self) -> Box<dyn QueueEventEmitterPort> {
        Box::new(self.clone())
    }
}

// ── Harness ────────────────────────────────────────────────────────

pub struct Harness {
    pub manager: QueueManager,
    pub engine: Arc<ScriptedEngine>,
    pub history: Arc<RecordingHistory>,
    pub events: EventLog,
}

impl Harness {
    pub fn new(concurrency: usize, engine: Arc<ScriptedEngine>) -> Self {
        Self::with_history(concurrency, engine, RecordingHistory::new())
    }

    pub fn with_history(
        concurrency: usize,
        engine: Arc<ScriptedEngine>,
        history: Arc<RecordingHistory>,
    ) -> Self {
        Self::with_config(
            QueueManagerConfig::default().with_concurrency(concurrency),
            engine,
            history,
        )
    }

    pub fn with_config(
        config: QueueManagerConfig,
        engine: Arc<ScriptedEngine>,
        history: Arc<RecordingHistory>,
    ) -> Self {
        let events = EventLog::new();
        let deps = QueueManagerDeps::new(engine.clone(), history.clone())
            .with_emitter(Arc::new(events.clone()));
        Self {
            manager: QueueManager::new(config, deps),
            engine,
            history,
            events,
        }
    }

    pub fn status(&self, id: JobId) -> JobStatus {
        self.manager.job(&id).map(|s| s.status).unwrap()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.manager.cancel_all();
        self.manager.stop();
    }
}

/// Poll `pred` until it holds or the timeout expires.
pub fn eventually(pred: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if pred() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    pred()
}
