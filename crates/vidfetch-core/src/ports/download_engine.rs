//! Download engine port definition.
//!
//! The engine is an opaque, blocking capability: given a URL and options it
//! performs the transfer and calls the progress hook as it goes. The queue runs
//! it on a blocking thread, never on the scheduler.
//!
//! # Cancellation
//!
//! Two mechanisms, both cooperative:
//!
//! - the hook returns `Err(HookError::CancelRequested)`; the engine must stop and
//!   return that error (wrapped as `EngineError::Aborted`)
//! - `EngineRequest::cancel` may be polled by engines that can check it between
//!   units of work, returning `EngineError::Cancelled`

use tokio_util::sync::CancellationToken;

use crate::download::{EngineError, HookError, JobOptions, ProgressRecord};

/// Progress hook handed to the engine for one run.
pub type ProgressHook<'a> = dyn FnMut(&ProgressRecord) -> Result<(), HookError> + Send + 'a;

/// Everything an engine needs for one run.
#[derive(Debug, Clone, Copy)]
pub struct EngineRequest<'a> {
    /// Target resource.
    pub url: &'a str,
    /// Pass-through options.
    pub options: &'a JobOptions,
    /// The job's cancellation token.
    pub cancel: &'a CancellationToken,
}

/// Port for running a single download to completion.
pub trait DownloadEnginePort: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Run the download, blocking the calling thread until it ends.
    ///
    /// Implementations must stop promptly and propagate the error when
    /// `on_progress` fails.
    fn run(
        &self,
        request: EngineRequest<'_>,
        on_progress: &mut ProgressHook<'_>,
    ) -> Result<(), EngineError>;
}
