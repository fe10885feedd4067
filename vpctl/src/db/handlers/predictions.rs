//! Database repository for the append-only prediction store.

use crate::db::{
    errors::Result,
    models::predictions::{PredictionCreateDBRequest, PredictionDBResponse},
};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

pub struct Predictions<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Predictions<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Record one prediction attempt. Single atomic insert.
    #[instrument(skip(self, request), fields(username = %request.username, outcome = %request.outcome), err)]
    pub async fn record(&mut self, request: &PredictionCreateDBRequest) -> Result<PredictionDBResponse> {
        let record = sqlx::query_as::<_, PredictionDBResponse>(
            r#"
            INSERT INTO predictions (username, features, outcome, timestamp)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, username, features, outcome, timestamp
            "#,
        )
        .bind(&request.username)
        .bind(request.features.to_string())
        .bind(&request.outcome)
        .bind(Utc::now())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(record)
    }

    /// Most recent records, newest first.
    #[instrument(skip(self), err)]
    pub async fn recent(&mut self, limit: i64) -> Result<Vec<PredictionDBResponse>> {
        let records = sqlx::query_as::<_, PredictionDBResponse>(
            "SELECT id, username, features, outcome, timestamp FROM predictions ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(records)
    }
}
