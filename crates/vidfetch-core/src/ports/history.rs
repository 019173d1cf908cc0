//! Download history repository port definition.
//!
//! The queue only ever calls `create` and `update_status`, and treats both as
//! fire-and-forget: a failure is logged and the job carries on. Listing and
//! search serve the `history` command.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;

use super::RepositoryError;
use crate::download::{HistoryEntry, JobStatus, RecordId};

/// Port for persisting download history.
///
/// Implementations must be safe to call concurrently from every worker.
#[async_trait]
pub trait HistoryRepositoryPort: Send + Sync {
    /// Create a record for a job that is about to start.
    async fn create(&self, url: &str) -> Result<RecordId, RepositoryError>;

    /// Update the status of an existing record.
    async fn update_status(&self, id: RecordId, status: JobStatus) -> Result<(), RepositoryError>;

    /// Most recent records first.
    async fn recent(&self, limit: u32) -> Result<Vec<HistoryEntry>, RepositoryError>;

    /// Case-insensitive search over URL and title, most recent first.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<HistoryEntry>, RepositoryError>;
}

/// History repository that remembers nothing.
///
/// Hands out increasing record ids so the queue behaves exactly as it does
/// with a real store. Used by `vidfetch get --no-history`.
#[derive(Debug, Default)]
pub struct NoopHistoryRepository {
    next_id: AtomicI64,
}

impl NoopHistoryRepository {
    /// Create a new no-op repository.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: AtomicI64::new(0),
        }
    }
}

#[async_trait]
impl HistoryRepositoryPort for NoopHistoryRepository {
    async fn create(&self, _url: &str) -> Result<RecordId, RepositoryError> {
        Ok(RecordId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1))
    }

    async fn update_status(&self, _id: RecordId, _status: JobStatus) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn recent(&self, _limit: u32) -> Result<Vec<HistoryEntry>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn search(&self, _query: &str, _limit: u32) -> Result<Vec<HistoryEntry>, RepositoryError> {
        Ok(Vec::new())
    }
}
