//! `SQLite` implementation of the `HistoryRepositoryPort` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use vidfetch_core::{HistoryEntry, HistoryRepositoryPort, JobStatus, RecordId, RepositoryError};

/// `SQLite` implementation of the `HistoryRepositoryPort` trait.
///
/// One row per started job in the `downloads` table.
pub struct SqliteHistoryRepository {
    pool: SqlitePool,
}

impl SqliteHistoryRepository {
    /// Create a new `SQLite` history repository.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryRepositoryPort for SqliteHistoryRepository {
    async fn create(&self, url: &str) -> Result<RecordId, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO downloads (url, title, status, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(url)
        .bind(url)
        .bind(JobStatus::Downloading.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(RecordId(result.last_insert_rowid()))
    }

    async fn update_status(&self, id: RecordId, status: JobStatus) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE downloads SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Download record {id}")));
        }

        Ok(())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<HistoryEntry>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, url, title, status, created_at
            FROM downloads
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        rows.iter().map(row_to_history_entry).collect()
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<HistoryEntry>, RepositoryError> {
        let pattern = format!("%{}%", escape_like(query));

        // LIKE is case-insensitive for ASCII in SQLite.
        let rows = sqlx::query(
            r#"
            SELECT id, url, title, status, created_at
            FROM downloads
            WHERE title LIKE ?1 ESCAPE '\' OR url LIKE ?1 ESCAPE '\'
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )
        .bind(&pattern)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        rows.iter().map(row_to_history_entry).collect()
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Convert a database row to a `HistoryEntry`.
fn row_to_history_entry(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryEntry, RepositoryError> {
    use sqlx::Row;

    let id: i64 = row.try_get("id").map_err(map_column_error)?;
    let url: String = row.try_get("url").map_err(map_column_error)?;
    let title: String = row.try_get("title").map_err(map_column_error)?;
    let status: String = row.try_get("status").map_err(map_column_error)?;
    let created_at: String = row.try_get("created_at").map_err(map_column_error)?;

    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| RepositoryError::Serialization(format!("created_at: {e}")))?
        .with_timezone(&Utc);

    Ok(HistoryEntry {
        id: RecordId(id),
        url,
        title,
        status: JobStatus::parse(&status),
        created_at,
    })
}

fn map_column_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(format!("Column read error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_test_database;

    async fn repo() -> SqliteHistoryRepository {
        SqliteHistoryRepository::new(setup_test_database().await.unwrap())
    }

    #[tokio::test]
    async fn test_create_starts_as_downloading() {
        let repo = repo().await;
        let id = repo.create("https://example.com/v/1").await.unwrap();

        let rows = repo.recent(10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].title, "https://example.com/v/1");
        assert_eq!(rows[0].status, JobStatus::Downloading);
    }

    #[tokio::test]
    async fn test_update_status() {
        let repo = repo().await;
        let id = repo.create("https://example.com/v/2").await.unwrap();

        repo.update_status(id, JobStatus::Cancelled).await.unwrap();

        let rows = repo.recent(10).await.unwrap();
        assert_eq!(rows[0].status, JobStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let repo = repo().await;
        let err = repo
            .update_status(RecordId(42), JobStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_limited() {
        let repo = repo().await;
        for n in 0..5 {
            repo.create(&format!("https://example.com/v/{n}")).await.unwrap();
        }

        let rows = repo.recent(3).await.unwrap();
        let urls: Vec<_> = rows.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            [
                "https://example.com/v/4",
                "https://example.com/v/3",
                "https://example.com/v/2"
            ]
        );
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_literal() {
        let repo = repo().await;
        repo.create("https://Videos.example.com/a").await.unwrap();
        repo.create("https://other.test/100%_real").await.unwrap();
        repo.create("https://other.test/plain").await.unwrap();

        let hits = repo.search("videos", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].url.contains("Videos"));

        let hits = repo.search("%_", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].url.ends_with("100%_real"));

        assert_eq!(repo.search("", 10).await.unwrap().len(), 3);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like(r"a%b_c\d"), r"a\%b\_c\\d");
        assert_eq!(escape_like("plain"), "plain");
    }
}
