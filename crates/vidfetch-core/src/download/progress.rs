//! Engine progress records.

use serde::{Deserialize, Serialize};

/// One progress report from the download engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Coarse status tag reported by the engine (`downloading`, `finished`, `error`).
    pub status: String,
    /// Bytes written so far, if known.
    pub downloaded_bytes: Option<u64>,
    /// Total size, if known.
    pub total_bytes: Option<u64>,
    /// The engine's full payload, forwarded untouched in `JobUpdated`.
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl ProgressRecord {
    /// Create a record without a raw payload.
    pub fn new(status: impl Into<String>, downloaded: Option<u64>, total: Option<u64>) -> Self {
        Self {
            status: status.into(),
            downloaded_bytes: downloaded,
            total_bytes: total,
            raw: serde_json::Value::Null,
        }
    }

    /// Attach the raw payload.
    #[must_use]
    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = raw;
        self
    }

    /// Whether the engine reported this file as done.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == "finished"
    }

    /// Percent complete for this record, see [`percent_complete`].
    #[must_use]
    pub fn percent(&self) -> u64 {
        percent_complete(self.downloaded_bytes, self.total_bytes)
    }
}

/// `floor(100 * downloaded / total)`.
///
/// A missing or zero total is treated as 1, so an unknown size yields
/// `100 * downloaded`. Callers treat anything above 100 as indeterminate.
#[must_use]
pub fn percent_complete(downloaded: Option<u64>, total: Option<u64>) -> u64 {
    let downloaded = downloaded.unwrap_or(0);
    let total = match total {
        Some(0) | None => 1,
        Some(t) => t,
    };
    downloaded.saturating_mul(100) / total
}
