//! The mutation history log.
//!
//! A single table inside the browsed database, created on first use. Writes
//! are best-effort: a failure to record a message never fails the mutation
//! it describes.

use chrono::{DateTime, NaiveDateTime, Utc};
use rowsql_core::{Builder, Page, Row, Value, HISTORY_TABLE};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::connection::Database;
use crate::error::{RepoError, Result};

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Row id, increasing with time.
    pub id: i64,
    /// Human-readable description.
    pub message: String,
    /// When the mutation was recorded.
    pub time: DateTime<Utc>,
}

impl HistoryEntry {
    fn from_row(row: Row) -> Result<Self> {
        let mut values = row.into_iter();
        let (Some(id), Some(message), Some(time)) = (values.next(), values.next(), values.next())
        else {
            return Err(RepoError::Decode(String::from("history row has fewer than 3 columns")));
        };

        let id = id
            .as_i64()
            .ok_or_else(|| RepoError::Decode(format!("history id '{id}' is not an integer")))?;
        let time = parse_time(&time.to_string())
            .ok_or_else(|| RepoError::Decode(format!("history time '{time}' is not a timestamp")))?;

        Ok(Self {
            id,
            message: message.to_string(),
            time,
        })
    }
}

fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").map(|dt| dt.and_utc()))
        .ok()
}

/// Reads and writes the history table.
#[derive(Debug)]
pub struct HistoryLog {
    db: Database,
    builder: Builder,
}

impl HistoryLog {
    /// Creates a history log over `db`, paging at most `max_limit` entries.
    #[must_use]
    pub fn new(db: Database, max_limit: i64) -> Self {
        let builder = Builder::new(db.kind(), max_limit);
        Self { db, builder }
    }

    /// Creates the history table if it does not exist.
    pub async fn ensure_table(&self) -> Result<()> {
        self.db
            .execute(&self.builder.create_history_table(), Vec::new())
            .await
            .map_err(RepoError::execution("create table", HISTORY_TABLE))?;
        Ok(())
    }

    /// Appends a message, creating the table first if it is missing.
    pub async fn append(&self, message: &str) -> Result<()> {
        let (sql, args) = self.builder.insert_history(message);
        match self.db.execute(&sql, args.clone()).await {
            Ok(_) => Ok(()),
            Err(err) if crate::error::is_missing_table(&err) => {
                debug!("History table missing, creating it");
                self.ensure_table().await?;
                self.db
                    .execute(&sql, args)
                    .await
                    .map_err(RepoError::execution("insert into", HISTORY_TABLE))?;
                Ok(())
            }
            Err(err) => Err(RepoError::execution("insert into", HISTORY_TABLE)(err)),
        }
    }

    /// Appends a message, logging instead of returning any failure.
    pub async fn record(&self, message: &str) {
        if let Err(err) = self.append(message).await {
            error!(error = %err, message = %message, "Failed to record history");
        }
    }

    /// Lists entries newest first.
    ///
    /// A missing table is created and reads as empty.
    pub async fn list(&self, page: Page) -> Result<Vec<HistoryEntry>> {
        let (sql, args) = self.builder.list_history(page.per_page, page.offset())?;
        let rows = match self.db.fetch_all(&sql, args).await {
            Ok(rows) => rows,
            Err(err) if crate::error::is_missing_table(&err) => {
                warn!("History table missing, creating it");
                self.ensure_table().await?;
                return Ok(Vec::new());
            }
            Err(err) => return Err(RepoError::execution("list", HISTORY_TABLE)(err)),
        };
        rows.into_iter().map(HistoryEntry::from_row).collect()
    }

    /// Deletes one entry. Returns the number of rows removed.
    pub async fn delete(&self, id: i64) -> Result<u64> {
        let (sql, args) = self.builder.delete_history(id);
        self.db
            .execute(&sql, args)
            .await
            .map_err(RepoError::execution("delete from", HISTORY_TABLE))
    }

    /// Counts entries.
    pub async fn count(&self) -> Result<i64> {
        let (sql, args) = self.builder.count_history();
        let row = self
            .db
            .fetch_optional(&sql, args)
            .await
            .map_err(RepoError::execution("count", HISTORY_TABLE))?;
        row.and_then(|r| r.first().and_then(Value::as_i64))
            .ok_or_else(|| RepoError::Decode(String::from("COUNT(*) returned no integer")))
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn log() -> HistoryLog {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        HistoryLog::new(Database::from(pool), 10)
    }

    #[test]
    fn test_parse_time_formats() {
        assert!(parse_time("2024-05-01T10:00:00+02:00").is_some());
        assert!(parse_time("2024-05-01 10:00:00").is_some());
        assert!(parse_time("yesterday").is_none());
    }

    #[tokio::test]
    async fn test_append_creates_table_lazily() {
        let log = log().await;
        log.append("Created table 'a'").await.unwrap();
        log.append("Dropped table 'a'").await.unwrap();

        let entries = log.list(Page::new(1, 10)).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "Dropped table 'a'");
        assert!(entries[0].id > entries[1].id);
        assert_eq!(log.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_missing_table_is_empty() {
        let log = log().await;
        assert!(log.list(Page::new(1, 10)).await.unwrap().is_empty());
        assert_eq!(log.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pagination_and_delete() {
        let log = log().await;
        for n in 0..5 {
            log.append(&format!("event {n}")).await.unwrap();
        }
        let second = log.list(Page::new(2, 2)).await.unwrap();
        assert_eq!(
            second.iter().map(|e| e.message.as_str()).collect::<Vec<_>>(),
            vec!["event 2", "event 1"]
        );

        assert_eq!(log.delete(second[0].id).await.unwrap(), 1);
        assert_eq!(log.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_list_rejects_oversized_page() {
        let log = log().await;
        assert!(matches!(
            log.list(Page::new(1, 11)).await,
            Err(RepoError::Build(_))
        ));
    }
}
