use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Request shape for recording a prediction attempt.
///
/// `features` is the full coerced feature snapshot; it is stored as JSON text
/// so the audit trail captures exactly what the classifier saw.
#[derive(Debug, Clone)]
pub struct PredictionCreateDBRequest {
    pub username: String,
    pub features: serde_json::Value,
    pub outcome: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PredictionDBResponse {
    pub id: i64,
    pub username: String,
    /// JSON-encoded feature snapshot as stored.
    pub features: String,
    pub outcome: String,
    pub timestamp: DateTime<Utc>,
}
