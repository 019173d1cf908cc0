//! `get` handler: queue URLs and follow them to completion.
//!
//! The first Ctrl+C cancels every job. The handler then waits for the queue to
//! stop, so partially written files are cleaned up by the engine before exit.
//! A second Ctrl+C exits at once, even while a job is stuck in shutdown.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use vidfetch_core::ports::{HistoryRepositoryPort, NoopHistoryRepository};
use vidfetch_core::{
    JobId, JobOptions, JobSnapshot, JobStatus, QueueEvent, Settings, ensure_directory,
};
use vidfetch_download::{QueueManager, QueueManagerConfig, QueueManagerDeps, YtDlpEngine};

use crate::bootstrap::CliContext;
use crate::presentation::JobDisplay;

/// Spacing of progress redraws per job.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Exit status of a forced interrupt (128 + SIGINT).
const FORCED_EXIT_CODE: i32 = 130;

/// Get command arguments passed from CLI.
pub struct GetArgs {
    pub urls: Vec<String>,
    pub file: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub out: Option<PathBuf>,
    pub quality: Option<String>,
    pub format: Option<String>,
    pub audio_only: bool,
    pub subs: bool,
    pub thumbnail: bool,
    pub no_history: bool,
}

/// Execute the get command.
///
/// Fails if no URL was given or if any job ended in `error`. Cancelled jobs
/// are not failures.
pub async fn execute(ctx: &CliContext, args: GetArgs) -> Result<()> {
    let urls = collect_urls(&args.urls, args.file.as_deref())?;
    if urls.is_empty() {
        bail!("No URLs given. Pass them as arguments or with --file.");
    }

    let options = job_options(&ctx.settings, &args);
    if let Some(dir) = &options.out_dir {
        ensure_directory(dir)?;
    }
    let concurrency = args
        .concurrency
        .unwrap_or_else(|| ctx.settings.effective_parallel_downloads());

    let manager = Arc::new(build_manager(ctx, concurrency, args.no_history));
    let mut events = manager.subscribe();
    let mut display = JobDisplay::new();

    let (notes_tx, mut notes) = mpsc::unbounded_channel();
    let interrupts = watch_interrupts(Arc::clone(&manager), notes_tx);

    let ids = manager.submit_all(urls, &options);
    manager.start();
    tracing::info!(jobs = ids.len(), concurrency, "Downloads queued");

    let summary = follow(&manager, &mut events, &mut notes, &mut display, ids).await;

    // stop() joins the queue thread
    let stopper = Arc::clone(&manager);
    let stopped = tokio::task::spawn_blocking(move || stopper.stop()).await;
    interrupts.abort();
    stopped.context("Queue shutdown panicked")?;

    display.note(&summary.to_string());
    if summary.failed > 0 {
        bail!("{} download(s) failed", summary.failed);
    }
    Ok(())
}

fn build_manager(ctx: &CliContext, concurrency: usize, no_history: bool) -> QueueManager {
    let engine = ctx
        .settings
        .ytdlp_path
        .as_ref()
        .map_or_else(YtDlpEngine::default, YtDlpEngine::new);

    let history: Arc<dyn HistoryRepositoryPort> = if no_history {
        Arc::new(NoopHistoryRepository::new())
    } else {
        Arc::clone(ctx.history())
    };

    let config = QueueManagerConfig::default()
        .with_concurrency(concurrency)
        .with_progress_interval(PROGRESS_INTERVAL);
    QueueManager::new(config, QueueManagerDeps::new(Arc::new(engine), history))
}

/// Merge explicit flags over the configured defaults.
fn job_options(settings: &Settings, args: &GetArgs) -> JobOptions {
    JobOptions {
        out_dir: Some(
            args.out
                .clone()
                .unwrap_or_else(|| settings.effective_download_dir()),
        ),
        quality: Some(
            args.quality
                .clone()
                .unwrap_or_else(|| settings.effective_quality().to_string()),
        ),
        format: args.format.clone(),
        audio_only: args.audio_only || settings.audio_only.unwrap_or(false),
        write_subtitles: args.subs || settings.write_subtitles.unwrap_or(false),
        write_thumbnail: args.thumbnail || settings.write_thumbnail.unwrap_or(false),
        extra_args: Vec::new(),
    }
}

/// URLs from arguments, then from `file`. Blank lines and `#` comments are skipped.
fn collect_urls(args: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut urls: Vec<String> = args
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .map(String::from)
        .collect();

    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read URL list {}", path.display()))?;
        urls.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(String::from),
        );
    }

    Ok(urls)
}

/// What a Ctrl+C does, by how many have been received so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterruptAction {
    /// Cancel every job and let the queue wind down.
    CancelAll,
    /// Leave without waiting for the queue.
    ForceExit,
}

impl InterruptAction {
    const fn for_count(received: usize) -> Self {
        if received <= 1 {
            Self::CancelAll
        } else {
            Self::ForceExit
        }
    }
}

/// Listen for Ctrl+C until aborted, covering both `follow` and `stop()`.
///
/// Messages for the user go through `notes` so the progress display owns
/// the terminal while it is live.
fn watch_interrupts(
    manager: Arc<QueueManager>,
    notes: mpsc::UnboundedSender<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut received = 0;
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
                return;
            }
            received += 1;
            match InterruptAction::for_count(received) {
                InterruptAction::CancelAll => {
                    let count = manager.cancel_all();
                    tracing::info!(count, "Interrupted, cancelling jobs");
                    // Nobody reads notes once follow() is done.
                    let _ = notes.send(format!(
                        "Cancelling {count} job(s)... press Ctrl+C again to exit now"
                    ));
                }
                InterruptAction::ForceExit => {
                    eprintln!("Interrupted again, exiting without waiting for downloads");
                    std::process::exit(FORCED_EXIT_CODE);
                }
            }
        }
    })
}

/// Drive the display until every job is terminal.
async fn follow(
    manager: &QueueManager,
    events: &mut broadcast::Receiver<QueueEvent>,
    notes: &mut mpsc::UnboundedReceiver<String>,
    display: &mut JobDisplay,
    ids: Vec<JobId>,
) -> Summary {
    let mut pending: HashSet<JobId> = ids.into_iter().collect();
    let mut summary = Summary::default();

    while !pending.is_empty() {
        tokio::select! {
            biased;
            Some(note) = notes.recv() => display.note(&note),
            received = events.recv() => match received {
                Ok(event) => {
                    display.apply(&event);
                    if event.is_terminal() && pending.remove(&event.id()) {
                        summary.record(&event);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Progress display fell behind");
                    reconcile(manager, &mut pending, display, &mut summary);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    summary
}

/// Catch up on terminal events lost to a lagging subscription.
fn reconcile(
    manager: &QueueManager,
    pending: &mut HashSet<JobId>,
    display: &mut JobDisplay,
    summary: &mut Summary,
) {
    let finished: Vec<QueueEvent> = pending
        .iter()
        .filter_map(|id| manager.job(id))
        .filter_map(|snapshot| terminal_event(&snapshot))
        .collect();

    for event in finished {
        pending.remove(&event.id());
        display.apply(&event);
        summary.record(&event);
    }
}

fn terminal_event(snapshot: &JobSnapshot) -> Option<QueueEvent> {
    match snapshot.status {
        JobStatus::Completed => Some(QueueEvent::completed(snapshot.id)),
        status if status.is_terminal() => Some(QueueEvent::failed(
            snapshot.id,
            status,
            snapshot.error.clone().unwrap_or_default(),
        )),
        _ => None,
    }
}

/// Outcome counts of one `get` run.
#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    completed: usize,
    failed: usize,
    cancelled: usize,
}

impl Summary {
    fn record(&mut self, event: &QueueEvent) {
        match event {
            QueueEvent::JobCompleted { .. } => self.completed += 1,
            QueueEvent::JobFailed {
                status: JobStatus::Cancelled,
                ..
            } => self.cancelled += 1,
            QueueEvent::JobFailed { .. } => self.failed += 1,
            _ => {}
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} completed, {} failed, {} cancelled",
            self.completed, self.failed, self.cancelled
        )
    }
}
