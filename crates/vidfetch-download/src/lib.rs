#![doc = include_str!("../README.md")]

// Internal modules (pub(crate) to keep implementation private)
pub(crate) mod progress;
pub(crate) mod queue;

// Engine adapters
pub mod engine;

// Public API
mod manager;

pub use engine::{EngineLine, ProtocolError, YtDlpEngine, parse_line};
pub use manager::{DEFAULT_CONCURRENCY, QueueManager, QueueManagerConfig, QueueManagerDeps};

// Re-export core types for convenience
pub use vidfetch_core::{
    JobId, JobOptions, JobSnapshot, JobStatus, QueueEvent, QueueEventEmitterPort,
};
