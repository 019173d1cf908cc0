//! Download error types.
//!
//! `EngineError` is what an engine adapter returns; `JobError` is the
//! classified outcome the queue persists and reports.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used for every user-requested cancellation.
pub const CANCELLED_MESSAGE: &str = "Cancelled by user";

/// Error returned by a progress hook to make the engine stop.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HookError {
    /// The job's cancellation was requested.
    #[error("{}", CANCELLED_MESSAGE)]
    CancelRequested,

    /// Caller-supplied progress handling failed.
    #[error("progress callback failed: {0}")]
    Callback(String),
}

/// Error type for download engine runs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The engine executable could not be started.
    #[error("Failed to start {program}: {message}")]
    Spawn {
        /// Program that failed to launch.
        program: String,
        /// OS error text.
        message: String,
    },

    /// I/O failure while talking to the engine.
    #[error("I/O error: {0}")]
    Io(String),

    /// The engine exited unsuccessfully.
    #[error("{message}")]
    ProcessFailed {
        /// Exit code if the process exited normally.
        code: Option<i32>,
        /// Captured diagnostic output or a summary.
        message: String,
    },

    /// A progress hook asked the engine to stop.
    #[error(transparent)]
    Aborted(#[from] HookError),

    /// The engine observed the job's cancellation token.
    #[error("{}", CANCELLED_MESSAGE)]
    Cancelled,

    /// General/uncategorized error.
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Create a spawn error.
    pub fn spawn(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Spawn {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error from a `std::io::Error`.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        Self::Io(err.to_string())
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Check if this error signals user-requested cancellation.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Aborted(HookError::CancelRequested))
    }
}

/// Classified terminal outcome of a failed job.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobError {
    /// The user cancelled the job.
    #[error("{}", CANCELLED_MESSAGE)]
    Cancelled,

    /// The job failed.
    #[error("{message}")]
    Failed {
        /// Error message.
        message: String,
    },
}

impl JobError {
    /// Create a failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Classify an engine error.
    ///
    /// `cancel_requested` is the job's flag at the moment the engine returned;
    /// any failure after cancellation was requested counts as a cancellation.
    #[must_use]
    pub fn from_engine(err: &EngineError, cancel_requested: bool) -> Self {
        if cancel_requested || err.is_cancellation() {
            Self::Cancelled
        } else {
            Self::failed(err.to_string())
        }
    }

    /// Check if this is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Status to persist for this outcome.
    #[must_use]
    pub const fn status(&self) -> super::JobStatus {
        match self {
            Self::Cancelled => super::JobStatus::Cancelled,
            Self::Failed { .. } => super::JobStatus::Error,
        }
    }

    /// Convert to a user-friendly message.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::JobStatus;

    #[test]
    fn test_hook_cancel_is_a_cancellation() {
        let err = EngineError::from(HookError::CancelRequested);
        assert!(err.is_cancellation());
        assert_eq!(err.to_string(), CANCELLED_MESSAGE);
        assert!(EngineError::Cancelled.is_cancellation());
    }

    #[test]
    fn test_callback_failure_is_not_a_cancellation() {
        let err = EngineError::from(HookError::Callback("boom".into()));
        assert!(!err.is_cancellation());
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_classification_uses_kind_and_flag() {
        let net = EngineError::ProcessFailed {
            code: Some(1),
            message: "HTTP Error 403".into(),
        };

        let failed = JobError::from_engine(&net, false);
        assert_eq!(failed.status(), JobStatus::Error);
        assert_eq!(failed.user_message(), "HTTP Error 403");

        // Engine wrapped the abort into a generic failure, but the flag was set.
        assert!(JobError::from_engine(&net, true).is_cancelled());
        assert!(JobError::from_engine(&EngineError::Cancelled, false).is_cancelled());
    }

    #[test]
    fn test_io_error_conversion_keeps_message() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = EngineError::from_io_error(&io_err);
        assert!(err.to_string().contains("pipe closed"));
    }
}
