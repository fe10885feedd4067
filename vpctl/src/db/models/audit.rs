use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One append-only audit record: who did what, when.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LogEntryDBResponse {
    pub id: i64,
    pub username: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}
