//! Download domain types, events, errors, and progress records.
//!
//! This module contains pure data types for the download queue. No I/O,
//! networking, or runtime dependencies allowed.
//!
//! # Structure
//!
//! - `types` - Identifiers and job options (`JobId`, `RecordId`, `JobOptions`)
//! - `events` - Job status, queue events and registry snapshots
//! - `errors` - Engine and job outcome errors
//! - `progress` - Engine progress records and percent computation
//! - `history` - Persisted history rows

pub mod errors;
pub mod events;
pub mod history;
pub mod progress;
pub mod types;

// Re-export commonly used types
pub use errors::{CANCELLED_MESSAGE, EngineError, HookError, JobError};
pub use events::{JobSnapshot, JobStatus, QueueEvent};
pub use history::HistoryEntry;
pub use progress::{ProgressRecord, percent_complete};
pub use types::{JobId, JobOptions, RecordId};
