use serde::{Deserialize, Serialize};

/// JSON response shape for programmatic `/predict` callers.
///
/// `success` reflects whether a real label was produced; it is false for the
/// model-unavailable and error-labeled outcomes as well as for rejections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub success: bool,
    pub prediction: String,
}
