//! Queue manager implementation.
//!
//! The manager is the caller-facing half of the queue. It owns the job
//! registry and the lifecycle of a background execution context that hosts
//! the worker pool.
//!
//! # Architecture
//!
//! - **Manager**: registry, lifecycle (`Stopped -> Running -> Stopped`), control API
//! - **Background**: dedicated thread with its own runtime; owns queue, gate, workers
//! - **Worker**: runs one job at a time via the engine port on the blocking pool
//!
//! # Concurrency Model
//!
//! - Control operations are posted to the background loop over a command channel
//! - Cancellation goes straight to the job's `CancellationToken`
//! - Jobs submitted while stopped are buffered and handed over exactly once by
//!   `start()`; `stop()` returns still-queued jobs to the buffer
//! - Lock order: transition → lifecycle → registry
//!
//! All control methods are synchronous and may be called from any thread,
//! except from inside a notification callback (`stop()` joins the thread that
//! runs those callbacks).

mod background;
mod registry;
mod worker;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use vidfetch_core::{
    BroadcastEmitter, DownloadEnginePort, HistoryRepositoryPort, JobId, JobOptions, JobSnapshot,
    NoopQueueEmitter, QueueEvent, QueueEventEmitterPort,
};

use background::{Background, Command};
use registry::{JobEntry, JobRegistry};
use worker::WorkerDeps;

/// Default number of concurrent workers.
pub const DEFAULT_CONCURRENCY: usize = 2;

// =============================================================================
// Configuration
// =============================================================================

/// Queue manager configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueManagerConfig {
    /// Number of concurrent workers (at least 1).
    pub concurrency: usize,
    /// Minimum spacing of intermediate progress events per job.
    /// Zero emits every engine update.
    pub progress_interval: Duration,
}

impl Default for QueueManagerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            progress_interval: Duration::ZERO,
        }
    }
}

impl QueueManagerConfig {
    /// Set the worker count, clamped to at least 1.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the progress throttle interval.
    #[must_use]
    pub const fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }
}

/// Ports the manager runs against.
#[derive(Clone)]
pub struct QueueManagerDeps {
    pub engine: Arc<dyn DownloadEnginePort>,
    pub history: Arc<dyn HistoryRepositoryPort>,
    /// Extra event sink; `subscribe()` works regardless.
    pub emitter: Arc<dyn QueueEventEmitterPort>,
}

impl QueueManagerDeps {
    /// Dependencies with no extra event sink.
    pub fn new(
        engine: Arc<dyn DownloadEnginePort>,
        history: Arc<dyn HistoryRepositoryPort>,
    ) -> Self {
        Self {
            engine,
            history,
            emitter: Arc::new(NoopQueueEmitter::new()),
        }
    }

    /// Also deliver every event to `emitter`.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<dyn QueueEventEmitterPort>) -> Self {
        self.emitter = emitter;
        self
    }
}

// =============================================================================
// Event fan-out
// =============================================================================

/// Delivers each event to the configured port, then to broadcast subscribers.
#[derive(Clone)]
struct Notifier {
    port: Arc<dyn QueueEventEmitterPort>,
    broadcast: BroadcastEmitter,
}

impl QueueEventEmitterPort for Notifier {
    fn emit(&self, event: QueueEvent) {
        self.port.emit(event.clone());
        self.broadcast.emit(event);
    }

    fn clone_box(&self) -> Box<dyn QueueEventEmitterPort> {
        Box::new(self.clone())
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

enum RunState {
    Stopped {
        /// Jobs waiting for the next `start()`, in submission order.
        pending: Vec<Arc<JobEntry>>,
    },
    Running {
        commands: mpsc::UnboundedSender<Command>,
        thread: JoinHandle<()>,
    },
}

struct Lifecycle {
    run: RunState,
    /// Remembered across restarts and applied on start.
    paused: bool,
    concurrency: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Queue Manager
// =============================================================================

/// Bounded-concurrency download queue.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use vidfetch_core::{JobOptions, NoopHistoryRepository};
/// use vidfetch_download::{QueueManager, QueueManagerConfig, QueueManagerDeps, YtDlpEngine};
///
/// let deps = QueueManagerDeps::new(
///     Arc::new(YtDlpEngine::default()),
///     Arc::new(NoopHistoryRepository::new()),
/// );
/// let manager = QueueManager::new(QueueManagerConfig::default(), deps);
/// let mut events = manager.subscribe();
///
/// manager.submit("https://example.com/watch?v=1", JobOptions::new("downloads"));
/// manager.start();
/// // ... consume `events` ...
/// manager.stop();
/// ```
pub struct QueueManager {
    registry: JobRegistry,
    deps: WorkerDeps,
    events: BroadcastEmitter,
    lifecycle: Mutex<Lifecycle>,
    /// Serializes `start()` and `stop()`.
    transition: Mutex<()>,
}

impl QueueManager {
    /// Create a stopped manager.
    pub fn new(config: QueueManagerConfig, deps: QueueManagerDeps) -> Self {
        let events = BroadcastEmitter::default();
        let notifier = Notifier {
            port: deps.emitter,
            broadcast: events.clone(),
        };

        Self {
            registry: JobRegistry::new(),
            deps: WorkerDeps {
                engine: deps.engine,
                history: deps.history,
                emitter: Arc::new(notifier),
                progress_interval: config.progress_interval,
            },
            events,
            lifecycle: Mutex::new(Lifecycle {
                run: RunState::Stopped {
                    pending: Vec::new(),
                },
                paused: false,
                concurrency: config.concurrency.max(1),
            }),
            transition: Mutex::new(()),
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Launch the background context. No-op while running.
    ///
    /// Jobs submitted while stopped are handed over in submission order. If
    /// the thread cannot be spawned the error is logged and the jobs stay
    /// buffered.
    pub fn start(&self) {
        let _transition = lock(&self.transition);
        let mut life = lock(&self.lifecycle);

        let pending = match &mut life.run {
            RunState::Running { .. } => return,
            RunState::Stopped { pending } => std::mem::take(pending),
        };

        let (commands, rx) = mpsc::unbounded_channel();
        let ctx = Background {
            initial: pending.clone(),
            paused: life.paused,
            concurrency: life.concurrency,
            deps: self.deps.clone(),
        };

        match background::spawn(ctx, rx) {
            Ok(thread) => {
                life.run = RunState::Running { commands, thread };
            }
            Err(e) => {
                tracing::error!(target: "vidfetch.queue", error = %e, "Failed to start queue thread");
                life.run = RunState::Stopped { pending };
            }
        }
    }

    /// Stop the background context and wait for it to exit. No-op while stopped.
    ///
    /// Workers finish the job they hold; queued jobs stay `queued` and are
    /// handed over again by the next `start()`. An engine call that never
    /// returns keeps this from returning.
    pub fn stop(&self) {
        let _transition = lock(&self.transition);

        let (commands, thread) = {
            let mut life = lock(&self.lifecycle);
            let previous = std::mem::replace(
                &mut life.run,
                RunState::Stopped {
                    pending: Vec::new(),
                },
            );
            match previous {
                RunState::Stopped { pending } => {
                    life.run = RunState::Stopped { pending };
                    return;
                }
                RunState::Running { commands, thread } => (commands, thread),
            }
        };

        // Err means the loop already exited on its own.
        let _ = commands.send(Command::Stop);
        drop(commands);

        if thread.join().is_err() {
            tracing::error!(target: "vidfetch.queue", "Queue thread panicked");
        }

        // The registry is authoritative: anything still queued, including
        // jobs submitted while we were waiting, goes back to the buffer.
        let mut life = lock(&self.lifecycle);
        life.run = RunState::Stopped {
            pending: self.registry.queued(),
        };
    }

    /// Whether the background context is running.
    pub fn is_running(&self) -> bool {
        matches!(lock(&self.lifecycle).run, RunState::Running { .. })
    }

    // -------------------------------------------------------------------------
    // Submission and cancellation
    // -------------------------------------------------------------------------

    /// Register a job and queue it (or buffer it until `start()`).
    ///
    /// `JobAdded` is emitted before this returns and before any worker can see
    /// the job.
    pub fn submit(&self, url: impl Into<String>, options: JobOptions) -> JobId {
        let entry = Arc::new(JobEntry::new(url, options));
        let id = entry.id;

        self.registry.insert(Arc::clone(&entry));
        self.deps.emitter.emit(QueueEvent::added(id, &entry.url));
        tracing::debug!(target: "vidfetch.queue", id = %id, url = %entry.url, "Job submitted");

        self.hand_off(entry);
        id
    }

    /// Submit several URLs with the same options, in order.
    pub fn submit_all<I, S>(&self, urls: I, options: &JobOptions) -> Vec<JobId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter()
            .map(|url| self.submit(url, options.clone()))
            .collect()
    }

    fn hand_off(&self, entry: Arc<JobEntry>) {
        let mut life = lock(&self.lifecycle);
        let lost = match &mut life.run {
            RunState::Stopped { pending } => {
                pending.push(entry);
                false
            }
            RunState::Running { commands, .. } => commands.send(Command::Enqueue(entry)).is_err(),
        };

        if lost {
            tracing::error!(
                target: "vidfetch.queue",
                "Queue thread exited unexpectedly; buffering jobs until the next start"
            );
            life.run = RunState::Stopped {
                pending: self.registry.queued(),
            };
        }
    }

    /// Request cancellation of a job.
    ///
    /// Returns `false` for unknown jobs, terminal jobs, and jobs already
    /// cancelled. A queued job ends `cancelled` without reaching the engine;
    /// a running one is aborted at its next progress report.
    pub fn cancel_job(&self, id: &JobId) -> bool {
        let cancelled = self
            .registry
            .get(id)
            .is_some_and(|entry| entry.request_cancel());
        if cancelled {
            tracing::debug!(target: "vidfetch.queue", id = %id, "Cancellation requested");
        }
        cancelled
    }

    /// Request cancellation of every non-terminal job.
    pub fn cancel_all(&self) -> usize {
        let count = self.registry.cancel_all();
        tracing::debug!(target: "vidfetch.queue", count, "Cancellation requested for all jobs");
        count
    }

    // -------------------------------------------------------------------------
    // Pause / resume / resize
    // -------------------------------------------------------------------------

    /// Withhold further dequeues. Running jobs are unaffected.
    pub fn pause(&self) {
        self.set_paused(true);
    }

    /// Allow dequeues again.
    pub fn resume(&self) {
        self.set_paused(false);
    }

    /// Whether the queue is (or will start) paused.
    pub fn is_paused(&self) -> bool {
        lock(&self.lifecycle).paused
    }

    fn set_paused(&self, paused: bool) {
        let mut life = lock(&self.lifecycle);
        life.paused = paused;
        if let RunState::Running { commands, .. } = &life.run {
            let command = if paused { Command::Pause } else { Command::Resume };
            // A dead loop is detected on the next submit; the flag is kept either way.
            let _ = commands.send(command);
        }
    }

    /// Change the number of workers, live if running.
    ///
    /// Growing spawns workers immediately. Shrinking retires workers at their
    /// next dequeue, so jobs already running finish first.
    pub fn resize(&self, concurrency: usize) {
        let concurrency = concurrency.max(1);
        let mut life = lock(&self.lifecycle);
        life.concurrency = concurrency;
        if let RunState::Running { commands, .. } = &life.run {
            let _ = commands.send(Command::Resize(concurrency));
        }
    }

    /// Configured worker count.
    pub fn concurrency(&self) -> usize {
        lock(&self.lifecycle).concurrency
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Snapshot of one job.
    pub fn job(&self, id: &JobId) -> Option<JobSnapshot> {
        self.registry.get(id).map(|entry| entry.snapshot())
    }

    /// Snapshots of every registered job, in submission order.
    pub fn jobs(&self) -> Vec<JobSnapshot> {
        self.registry.snapshots()
    }

    /// Forget terminal jobs. Returns how many were removed.
    pub fn clear_finished(&self) -> usize {
        self.registry.clear_finished()
    }

    /// Subscribe to queue events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }
}
