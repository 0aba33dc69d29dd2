//! Prediction result model

use serde::Serialize;

/// Scorer output returned to the caller. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub is_fraud: bool,
    /// Not a probability. The model scorer reports `|decision score|`.
    pub confidence: f64,
    pub anomaly_score: f64,
}
