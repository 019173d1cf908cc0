//! Persisted download history rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::events::JobStatus;
use super::types::RecordId;

/// A row of download history, as shown by `vidfetch history`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: RecordId,
    pub url: String,
    /// Title if known; the URL until the engine reports something better.
    pub title: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Case-insensitive match against title and URL.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        needle.is_empty()
            || self.title.to_lowercase().contains(&needle)
            || self.url.to_lowercase().contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, title: &str) -> HistoryEntry {
        HistoryEntry {
            id: RecordId(1),
            url: url.to_string(),
            title: title.to_string(),
            status: JobStatus::Completed,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_matches_title_or_url_ignoring_case() {
        let e = entry("https://example.com/watch?v=abc", "Rust Talk");
        assert!(e.matches("rust"));
        assert!(e.matches("EXAMPLE"));
        assert!(e.matches(""));
        assert!(!e.matches("python"));
    }
}
