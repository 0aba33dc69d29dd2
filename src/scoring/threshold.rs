//! Threshold Scorer
//!
//! Flags any transfer above a fixed ETH value. Every output is a constant;
//! nothing here is statistical.

use super::{FraudScorer, ScoringError};
use crate::features::FeatureVector;
use crate::models::PredictionResult;

pub const VALUE_THRESHOLD_ETH: f64 = 5.0;
pub const CONFIDENCE: f64 = 0.85;
pub const FRAUD_SCORE: f64 = 0.78;
pub const NORMAL_SCORE: f64 = -0.23;

#[derive(Debug, Clone)]
pub struct ThresholdScorer {
    threshold_eth: f64,
}

impl Default for ThresholdScorer {
    fn default() -> Self {
        Self {
            threshold_eth: VALUE_THRESHOLD_ETH,
        }
    }
}

impl FraudScorer for ThresholdScorer {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn score(&self, features: &FeatureVector) -> Result<PredictionResult, ScoringError> {
        // strictly greater: exactly 5.0 is not fraud
        let is_fraud = features.value_eth() > self.threshold_eth;

        Ok(PredictionResult {
            is_fraud,
            confidence: CONFIDENCE,
            anomaly_score: if is_fraud { FRAUD_SCORE } else { NORMAL_SCORE },
        })
    }
}
