//! Database repository for the append-only audit log.

use crate::db::{errors::Result, models::audit::LogEntryDBResponse};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

pub struct AuditLog<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> AuditLog<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Append one action record. Single atomic insert.
    #[instrument(skip(self), err)]
    pub async fn append(&mut self, username: &str, action: &str) -> Result<LogEntryDBResponse> {
        let entry = sqlx::query_as::<_, LogEntryDBResponse>(
            r#"
            INSERT INTO logs (username, action, timestamp)
            VALUES (?1, ?2, ?3)
            RETURNING id, username, action, timestamp
            "#,
        )
        .bind(username)
        .bind(action)
        .bind(Utc::now())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(entry)
    }

    /// Most recent entries, newest first.
    #[instrument(skip(self), err)]
    pub async fn recent(&mut self, limit: i64) -> Result<Vec<LogEntryDBResponse>> {
        let entries = sqlx::query_as::<_, LogEntryDBResponse>(
            "SELECT id, username, action, timestamp FROM logs ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(entries)
    }
}
