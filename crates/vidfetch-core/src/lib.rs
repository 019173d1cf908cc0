#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod download;
pub mod paths;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use download::{
    CANCELLED_MESSAGE, EngineError, HistoryEntry, HookError, JobError, JobId, JobOptions,
    JobSnapshot, JobStatus, ProgressRecord, QueueEvent, RecordId, percent_complete,
};
pub use ports::{
    BroadcastEmitter, DownloadEnginePort, EngineRequest, HistoryRepositoryPort,
    NoopHistoryRepository, NoopQueueEmitter, ProgressHook, QueueEventEmitterPort,
    RepositoryError,
};
pub use settings::{
    DEFAULT_PARALLEL_DOWNLOADS, DEFAULT_QUALITY, Settings, SettingsError, SettingsUpdate,
    load_settings, save_settings, validate_settings,
};

// Re-export path utilities
pub use paths::{PathError, data_root, database_path, ensure_directory, settings_path};

