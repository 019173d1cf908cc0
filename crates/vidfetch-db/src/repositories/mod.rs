//! Repository implementations using `SQLite`.
//!
//! The `SqlitePool` is confined to this module and never exposed through
//! the port trait signatures.

mod sqlite_history_repository;

pub use sqlite_history_repository::SqliteHistoryRepository;
