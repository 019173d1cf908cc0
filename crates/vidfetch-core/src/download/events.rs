//! Queue events - discriminated union for all job state changes.

use serde::{Deserialize, Serialize};

use super::types::{JobId, JobOptions, RecordId};

/// Status of a job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting in the queue (or in the pre-start buffer).
    #[default]
    Queued,
    /// A worker is running it.
    Downloading,
    /// Finished successfully.
    Completed,
    /// Failed with an error.
    Error,
    /// Cancelled by the user.
    Cancelled,
}

impl JobStatus {
    /// Convert to string representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "downloading" => Self::Downloading,
            "completed" => Self::Completed,
            "error" => Self::Error,
            "cancelled" => Self::Cancelled,
            // "queued" or unknown values default to Queued
            _ => Self::Queued,
        }
    }

    /// Whether no further transition can happen.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a registered job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub url: String,
    pub options: JobOptions,
    pub status: JobStatus,
    /// Last reported percent; may exceed 100 when the total size is unknown.
    pub progress: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    /// Set once the job ended in `error` or `cancelled`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub cancel_requested: bool,
}

/// Single discriminated union for all queue notifications.
///
/// Per job the order is always `JobAdded`, zero or more `JobUpdated`, then
/// exactly one of `JobCompleted` / `JobFailed`.
///
/// ```json
/// { "type": "job_added", "id": "…", "url": "https://…" }
/// { "type": "job_updated", "id": "…", "status": "downloading", "percent": 42, "raw": { … } }
/// { "type": "job_completed", "id": "…" }
/// { "type": "job_failed", "id": "…", "status": "cancelled", "message": "Cancelled by user" }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueEvent {
    /// A job was registered.
    JobAdded {
        id: JobId,
        url: String,
    },

    /// Progress or state update from a running job.
    JobUpdated {
        id: JobId,
        /// Coarse engine status tag (`downloading`, `finished`, ...).
        status: String,
        /// `floor(100 * downloaded / total)`; outside 0..=100 means indeterminate.
        percent: u64,
        /// The engine's raw progress payload.
        raw: serde_json::Value,
    },

    /// The job finished successfully.
    JobCompleted {
        id: JobId,
    },

    /// The job failed or was cancelled.
    JobFailed {
        id: JobId,
        /// Either `error` or `cancelled`.
        status: JobStatus,
        /// Human-readable explanation.
        message: String,
    },
}

impl QueueEvent {
    /// Create a job added event.
    pub fn added(id: JobId, url: impl Into<String>) -> Self {
        Self::JobAdded {
            id,
            url: url.into(),
        }
    }

    /// Create a progress event.
    pub fn updated(
        id: JobId,
        status: impl Into<String>,
        percent: u64,
        raw: serde_json::Value,
    ) -> Self {
        Self::JobUpdated {
            id,
            status: status.into(),
            percent,
            raw,
        }
    }

    /// Create a completion event.
    #[must_use]
    pub const fn completed(id: JobId) -> Self {
        Self::JobCompleted { id }
    }

    /// Create a failure event.
    pub fn failed(id: JobId, status: JobStatus, message: impl Into<String>) -> Self {
        Self::JobFailed {
            id,
            status,
            message: message.into(),
        }
    }

    /// The job this event belongs to.
    #[must_use]
    pub const fn id(&self) -> JobId {
        match self {
            Self::JobAdded { id, .. }
            | Self::JobUpdated { id, .. }
            | Self::JobCompleted { id }
            | Self::JobFailed { id, .. } => *id,
        }
    }

    /// Whether this is the last event the job will ever produce.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::JobCompleted { .. } | Self::JobFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_storage_form() {
        for status in [
            JobStatus::Queued,
            JobStatus::Downloading,
            JobStatus::Completed,
            JobStatus::Error,
            JobStatus::Cancelled,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), status);
        }
        assert_eq!(JobStatus::parse("bogus"), JobStatus::Queued);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Downloading.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let id = JobId::new();
        let json = serde_json::to_value(QueueEvent::failed(
            id,
            JobStatus::Cancelled,
            "Cancelled by user",
        ))
        .unwrap();

        assert_eq!(json["type"], "job_failed");
        assert_eq!(json["status"], "cancelled");
        assert_eq!(json["id"], id.to_string());
    }

    #[test]
    fn test_event_id_and_terminality() {
        let id = JobId::new();
        assert_eq!(QueueEvent::added(id, "u").id(), id);
        assert!(!QueueEvent::added(id, "u").is_terminal());
        assert!(!QueueEvent::updated(id, "downloading", 5, serde_json::Value::Null).is_terminal());
        assert!(QueueEvent::completed(id).is_terminal());
    }
}
