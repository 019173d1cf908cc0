//! Worker loop and single-job pipeline.
//!
//! A worker waits for the pause gate, takes one job, runs it to a terminal
//! state and loops. It never touches the registry or the manager; everything
//! it needs arrives as the job entry plus cloned port handles.
//!
//! # Ordering
//!
//! Per job: the history record is created, the job turns `downloading` with
//! that record attached, then `JobUpdated(downloading, 0)`, engine progress
//! updates and exactly one of `JobCompleted` / `JobFailed`. The terminal
//! event is emitted only after the registry shows the terminal status and the
//! history record has been updated.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use vidfetch_core::{
    CANCELLED_MESSAGE, DownloadEnginePort, EngineRequest, HistoryRepositoryPort, HookError,
    JobError, JobStatus, ProgressRecord, QueueEvent, QueueEventEmitterPort,
};

use crate::progress::ProgressThrottle;
use crate::queue::{GateWatcher, JobQueue};

use super::registry::JobEntry;

/// Dependencies shared by every worker.
///
/// Cloned `Arc` handles to the ports; no access to manager state.
#[derive(Clone)]
pub struct WorkerDeps {
    pub engine: Arc<dyn DownloadEnginePort>,
    pub history: Arc<dyn HistoryRepositoryPort>,
    pub emitter: Arc<dyn QueueEventEmitterPort>,
    /// Minimum spacing of intermediate progress events per job.
    pub progress_interval: Duration,
}

/// Run one worker until `retire` fires.
///
/// `retire` is only observed between jobs, so a retiring worker always
/// finishes the job it holds.
pub async fn worker_loop(
    worker: usize,
    queue: JobQueue<Arc<JobEntry>>,
    mut gate: GateWatcher,
    retire: CancellationToken,
    deps: WorkerDeps,
) {
    tracing::debug!(target: "vidfetch.queue", worker, "Worker started");

    loop {
        tokio::select! {
            biased;
            () = retire.cancelled() => break,
            () = gate.running() => {}
        }

        // A pause that lands while waiting for work sends us back to the gate.
        let entry = tokio::select! {
            biased;
            () = retire.cancelled() => break,
            () = gate.paused() => continue,
            job = queue.pop() => match job {
                Some(job) => job,
                None => break,
            },
        };

        process(worker, entry, &deps).await;
    }

    tracing::debug!(target: "vidfetch.queue", worker, "Worker stopped");
}

/// Take a dequeued job to a terminal state.
async fn process(worker: usize, entry: Arc<JobEntry>, deps: &WorkerDeps) {
    if entry.cancel.is_cancelled() {
        finish_cancelled_before_start(&entry, deps);
        return;
    }
    if entry.status() != JobStatus::Queued {
        tracing::debug!(
            target: "vidfetch.queue",
            id = %entry.id,
            status = %entry.status(),
            "Skipping job that is no longer queued"
        );
        return;
    }

    // Own task so a panicking port only takes this job down.
    let task = tokio::spawn(run_job(worker, Arc::clone(&entry), deps.clone()));
    if let Err(e) = task.await {
        tracing::error!(target: "vidfetch.queue", id = %entry.id, error = %e, "Job task aborted");
        let message = format!("Internal error: {e}");
        if entry.finish(JobStatus::Error, Some(message.clone())) {
            deps.emitter
                .emit(QueueEvent::failed(entry.id, JobStatus::Error, message));
        }
    }
}

/// Cancelled while still queued: no engine call, no history record.
fn finish_cancelled_before_start(entry: &JobEntry, deps: &WorkerDeps) {
    tracing::debug!(target: "vidfetch.queue", id = %entry.id, "Job cancelled before start");
    if entry.finish(JobStatus::Cancelled, Some(CANCELLED_MESSAGE.to_string())) {
        deps.emitter.emit(QueueEvent::failed(
            entry.id,
            JobStatus::Cancelled,
            CANCELLED_MESSAGE,
        ));
    }
}

async fn run_job(worker: usize, entry: Arc<JobEntry>, deps: WorkerDeps) {
    let id = entry.id;
    tracing::debug!(
        target: "vidfetch.queue",
        worker,
        id = %id,
        url = %entry.url,
        engine = deps.engine.name(),
        "Job started"
    );

    let record_id = match deps.history.create(&entry.url).await {
        Ok(record_id) => Some(record_id),
        Err(e) => {
            tracing::warn!(
                target: "vidfetch.queue",
                id = %id,
                error = %e,
                "Failed to create history record"
            );
            None
        }
    };

    // Only a cancel landing while the record was created can refuse the start.
    if !entry.begin(record_id) {
        settle(&entry, &deps, Err(JobError::Cancelled)).await;
        return;
    }

    deps.emitter.emit(QueueEvent::updated(
        id,
        JobStatus::Downloading.as_str(),
        0,
        serde_json::json!({}),
    ));

    let outcome = run_engine(&entry, &deps).await;
    settle(&entry, &deps, outcome).await;
}

/// Persist the outcome, then publish it.
async fn settle(entry: &JobEntry, deps: &WorkerDeps, outcome: Result<(), JobError>) {
    let id = entry.id;
    let status = match &outcome {
        Ok(()) => JobStatus::Completed,
        Err(err) => err.status(),
    };

    if let Some(record_id) = entry.record_id() {
        if let Err(e) = deps.history.update_status(record_id, status).await {
            tracing::warn!(
                target: "vidfetch.queue",
                id = %id,
                record = %record_id,
                error = %e,
                "Failed to persist job status"
            );
        }
    }

    match outcome {
        Ok(()) => {
            if entry.finish(JobStatus::Completed, None) {
                tracing::info!(target: "vidfetch.queue", id = %id, "Job completed");
                deps.emitter.emit(QueueEvent::completed(id));
            }
        }
        Err(err) => {
            let message = err.user_message();
            if err.is_cancelled() {
                tracing::debug!(target: "vidfetch.queue", id = %id, "Job cancelled");
            } else {
                tracing::warn!(target: "vidfetch.queue", id = %id, error = %message, "Job failed");
            }
            if entry.finish(status, Some(message.clone())) {
                deps.emitter.emit(QueueEvent::failed(id, status, message));
            }
        }
    }
}

/// Run the engine on the blocking pool and classify the result.
async fn run_engine(entry: &Arc<JobEntry>, deps: &WorkerDeps) -> Result<(), JobError> {
    let engine = Arc::clone(&deps.engine);
    let emitter = Arc::clone(&deps.emitter);
    let job = Arc::clone(entry);
    let interval = deps.progress_interval;

    let result = tokio::task::spawn_blocking(move || {
        let mut throttle = ProgressThrottle::new(interval);
        let mut hook = |record: &ProgressRecord| -> Result<(), HookError> {
            if job.cancel.is_cancelled() {
                return Err(HookError::CancelRequested);
            }
            let percent = record.percent();
            job.set_progress(percent);
            if throttle.should_emit(record.is_finished()) {
                let event =
                    QueueEvent::updated(job.id, record.status.clone(), percent, record.raw.clone());
                // A failing subscriber stops this engine run, not the worker.
                panic::catch_unwind(AssertUnwindSafe(|| emitter.emit(event)))
                    .map_err(|payload| HookError::Callback(panic_message(payload.as_ref())))?;
            }
            Ok(())
        };

        let request = EngineRequest {
            url: &job.url,
            options: &job.options,
            cancel: &job.cancel,
        };
        engine.run(request, &mut hook)
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(JobError::from_engine(&e, entry.cancel.is_cancelled())),
        Err(e) => Err(JobError::failed(format!("Download engine crashed: {e}"))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_from_payload() {
        let payload = panic::catch_unwind(|| panic!("subscriber gone")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "subscriber gone");

        let payload = panic::catch_unwind(|| panic::panic_any(String::from("code 7"))).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "code 7");

        let payload = panic::catch_unwind(|| panic::panic_any(42_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
