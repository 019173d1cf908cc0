//! Background execution context.
//!
//! One dedicated thread runs a current-thread tokio runtime hosting the
//! command loop and N worker tasks. The job queue and pause gate are created
//! and mutated only here; the caller side talks to them through [`Command`].

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::queue::{JobQueue, PauseGate};

use super::registry::JobEntry;
use super::worker::{WorkerDeps, worker_loop};

/// Control operations posted from the caller to the background loop.
#[derive(Debug)]
pub enum Command {
    Enqueue(Arc<JobEntry>),
    Pause,
    Resume,
    Resize(usize),
    Stop,
}

/// Everything the background loop starts with.
pub struct Background {
    /// Jobs buffered before start, in submission order.
    pub initial: Vec<Arc<JobEntry>>,
    pub paused: bool,
    pub concurrency: usize,
    pub deps: WorkerDeps,
}

/// Launch the background thread.
pub fn spawn(
    ctx: Background,
    commands: mpsc::UnboundedReceiver<Command>,
) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("vidfetch-queue".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::error!(
                        target: "vidfetch.queue",
                        error = %e,
                        "Failed to build queue runtime"
                    );
                    return;
                }
            };
            runtime.block_on(run(ctx, commands));
        })
}

async fn run(ctx: Background, mut commands: mpsc::UnboundedReceiver<Command>) {
    let queue = JobQueue::new();
    let buffered = ctx.initial.len();
    for job in ctx.initial {
        queue.push(job);
    }

    let gate = PauseGate::new(ctx.paused);
    let mut pool = WorkerPool::new(queue.clone(), ctx.deps);
    pool.resize(ctx.concurrency, &gate);

    tracing::info!(
        target: "vidfetch.queue",
        workers = pool.size(),
        paused = gate.is_paused(),
        buffered,
        "Queue started"
    );

    // A closed channel means the manager is gone; treat it like Stop.
    while let Some(command) = commands.recv().await {
        match command {
            Command::Enqueue(job) => queue.push(job),
            Command::Pause => {
                if gate.pause() {
                    tracing::debug!(target: "vidfetch.queue", "Queue paused");
                }
            }
            Command::Resume => {
                if gate.resume() {
                    tracing::debug!(target: "vidfetch.queue", "Queue resumed");
                }
            }
            Command::Resize(n) => pool.resize(n, &gate),
            Command::Stop => break,
        }
    }

    pool.shutdown().await;

    // Still `queued` in the registry; the manager buffers them for the next start.
    let leftover = queue.drain().await.len();
    tracing::info!(target: "vidfetch.queue", leftover, "Queue stopped");
}

/// The set of worker tasks.
///
/// Each worker owns a retire token derived from the pool's shutdown token.
/// Shrinking cancels the newest workers' tokens; they exit at their next
/// dequeue point, after any job they hold has finished.
struct WorkerPool {
    queue: JobQueue<Arc<JobEntry>>,
    deps: WorkerDeps,
    shutdown: CancellationToken,
    active: Vec<CancellationToken>,
    tasks: JoinSet<()>,
    spawned: usize,
}

impl WorkerPool {
    fn new(queue: JobQueue<Arc<JobEntry>>, deps: WorkerDeps) -> Self {
        Self {
            queue,
            deps,
            shutdown: CancellationToken::new(),
            active: Vec::new(),
            tasks: JoinSet::new(),
            spawned: 0,
        }
    }

    fn size(&self) -> usize {
        self.active.len()
    }

    fn resize(&mut self, target: usize, gate: &PauseGate) {
        let target = target.max(1);
        let before = self.active.len();

        while self.active.len() < target {
            self.spawned += 1;
            let retire = self.shutdown.child_token();
            self.tasks.spawn(worker_loop(
                self.spawned,
                self.queue.clone(),
                gate.watcher(),
                retire.clone(),
                self.deps.clone(),
            ));
            self.active.push(retire);
        }

        while self.active.len() > target {
            if let Some(retire) = self.active.pop() {
                retire.cancel();
            }
        }

        self.reap();

        if before != target {
            tracing::debug!(target: "vidfetch.queue", from = before, to = target, "Worker pool resized");
        }
    }

    /// Collect workers that already exited.
    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            log_worker_exit(result);
        }
    }

    async fn shutdown(mut self) {
        self.shutdown.cancel();
        while let Some(result) = self.tasks.join_next().await {
            log_worker_exit(result);
        }
    }
}

fn log_worker_exit(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(target: "vidfetch.queue", error = %e, "Worker task failed");
    }
}
