//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the queue expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `sqlx` types in any signature
//! - No subprocess details; the engine port is a blocking call with a hook
//! - Emitters never block

pub mod download_engine;
pub mod history;
pub mod queue_event_emitter;

use thiserror::Error;

pub use download_engine::{DownloadEnginePort, EngineRequest, ProgressHook};
pub use history::{HistoryRepositoryPort, NoopHistoryRepository};
pub use queue_event_emitter::{BroadcastEmitter, NoopQueueEmitter, QueueEventEmitterPort};

/// Domain-specific errors for repository operations.
///
/// This error type abstracts away storage implementation details (e.g., sqlx errors)
/// and provides a clean interface for services to handle storage failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error (database, filesystem, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
