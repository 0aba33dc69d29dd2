//! Anomaly Model Scorer
//!
//! Scales the feature vector with the fitted scaler, then asks the one-class
//! anomaly model for its label and decision score.
//!
//! Label convention: `-1` = anomaly (fraud), `1` = normal.
//! `confidence` is `|decision score|`, a distance from the decision boundary.
//! It is NOT a probability and is not bounded to [0, 1].

use std::path::Path;
use std::time::Instant;

use thiserror::Error;

use super::onnx::OnnxAnomalyModel;
use super::scaler::StandardScaler;
use super::{ArtifactError, FraudScorer, ScoringError};
use crate::config::Config;
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::models::PredictionResult;

pub const LABEL_ANOMALY: i64 = -1;
pub const LABEL_NORMAL: i64 = 1;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct InferenceError(pub String);

/// One evaluation of the model on a single scaled row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelOutput {
    /// `predict` label
    pub label: i64,
    /// `decision_function` value; negative = anomalous
    pub score: f64,
}

/// Anything that behaves like a fitted one-class detector
pub trait AnomalyModel: Send + Sync {
    fn evaluate(&self, scaled: &[f64; FEATURE_COUNT]) -> Result<ModelOutput, InferenceError>;
}

pub struct ModelScorer {
    scaler: StandardScaler,
    model: Box<dyn AnomalyModel>,
}

impl ModelScorer {
    pub fn new(scaler: StandardScaler, model: Box<dyn AnomalyModel>) -> Self {
        Self { scaler, model }
    }

    /// Load scaler and model from the configured paths. Any failure here is
    /// fatal for the process.
    pub fn load(config: &Config) -> Result<Self, ArtifactError> {
        let scaler = StandardScaler::load(Path::new(&config.scaler_path))?;
        let model = OnnxAnomalyModel::load(
            Path::new(&config.model_path),
            config.model_sha256.as_deref(),
            &config.model_label_output,
            &config.model_score_output,
        )?;

        Ok(Self::new(scaler, Box::new(model)))
    }

    fn run(&self, features: &FeatureVector) -> Result<PredictionResult, InferenceError> {
        let scaled = self.scaler.transform(features);
        if scaled.iter().any(|v| !v.is_finite()) {
            return Err(InferenceError(
                "Input contains NaN, infinity or a value too large".to_string(),
            ));
        }

        let output = self.model.evaluate(&scaled)?;

        let is_fraud = match output.label {
            LABEL_ANOMALY => true,
            LABEL_NORMAL => false,
            other => {
                return Err(InferenceError(format!("unexpected model label {}", other)));
            }
        };

        Ok(PredictionResult {
            is_fraud,
            anomaly_score: output.score,
            confidence: output.score.abs(),
        })
    }
}

impl FraudScorer for ModelScorer {
    fn name(&self) -> &'static str {
        "model"
    }

    fn score(&self, features: &FeatureVector) -> Result<PredictionResult, ScoringError> {
        let start = Instant::now();

        let result = self
            .run(features)
            .map_err(|e| ScoringError::Prediction(e.to_string()))?;

        tracing::debug!(
            is_fraud = result.is_fraud,
            anomaly_score = result.anomaly_score,
            inference_us = start.elapsed().as_micros() as u64,
            "Model scored transaction"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::derive;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Labels anything whose scaled value_eth exceeds `cutoff` as an outlier,
    /// with score `cutoff - x`.
    struct CutoffModel {
        cutoff: f64,
        seen: Mutex<Vec<[f64; FEATURE_COUNT]>>,
    }

    impl CutoffModel {
        fn new(cutoff: f64) -> Self {
            Self { cutoff, seen: Mutex::new(Vec::new()) }
        }
    }

    impl AnomalyModel for CutoffModel {
        fn evaluate(&self, scaled: &[f64; FEATURE_COUNT]) -> Result<ModelOutput, InferenceError> {
            self.seen.lock().push(*scaled);
            let score = self.cutoff - scaled[0];
            let label = if score < 0.0 { LABEL_ANOMALY } else { LABEL_NORMAL };
            Ok(ModelOutput { label, score })
        }
    }

    impl AnomalyModel for std::sync::Arc<CutoffModel> {
        fn evaluate(&self, scaled: &[f64; FEATURE_COUNT]) -> Result<ModelOutput, InferenceError> {
            self.as_ref().evaluate(scaled)
        }
    }

    struct FixedModel(ModelOutput);

    impl AnomalyModel for FixedModel {
        fn evaluate(&self, _: &[f64; FEATURE_COUNT]) -> Result<ModelOutput, InferenceError> {
            Ok(self.0)
        }
    }

    struct BrokenModel;

    impl AnomalyModel for BrokenModel {
        fn evaluate(&self, _: &[f64; FEATURE_COUNT]) -> Result<ModelOutput, InferenceError> {
            Err(InferenceError("X has 10 features, but model expects 11".to_string()))
        }
    }

    fn identity_scaler() -> StandardScaler {
        StandardScaler::new(vec![0.0; FEATURE_COUNT], vec![1.0; FEATURE_COUNT]).unwrap()
    }

    fn features(value_eth: f64) -> FeatureVector {
        derive(json!({ "value_eth": value_eth, "gas_price_eth": 0.0002 }).as_object().unwrap()).unwrap()
    }

    #[test]
    fn test_normal_label_is_not_fraud() {
        let scorer = ModelScorer::new(
            identity_scaler(),
            Box::new(FixedModel(ModelOutput { label: 1, score: 0.12 })),
        );
        let result = scorer.score(&features(1.5)).unwrap();

        assert!(!result.is_fraud);
        assert_eq!(result.anomaly_score, 0.12);
        assert_eq!(result.confidence, 0.12);
    }

    #[test]
    fn test_outlier_label_is_fraud() {
        let scorer = ModelScorer::new(
            identity_scaler(),
            Box::new(FixedModel(ModelOutput { label: -1, score: -0.31 })),
        );
        let result = scorer.score(&features(250.0)).unwrap();

        assert!(result.is_fraud);
        assert_eq!(result.anomaly_score, -0.31);
        assert_eq!(result.confidence, 0.31);
    }

    #[test]
    fn test_model_sees_scaled_vector() {
        let mut mean = vec![0.0; FEATURE_COUNT];
        let mut scale = vec![1.0; FEATURE_COUNT];
        mean[0] = 1.0;
        scale[0] = 2.0;
        let model = std::sync::Arc::new(CutoffModel::new(3.0));
        let scorer = ModelScorer::new(StandardScaler::new(mean, scale).unwrap(), Box::new(model.clone()));

        // (9 - 1) / 2 = 4 > 3
        let result = scorer.score(&features(9.0)).unwrap();
        assert!(result.is_fraud);
        assert_eq!(result.anomaly_score, -1.0);

        // (3 - 1) / 2 = 1 <= 3
        let result = scorer.score(&features(3.0)).unwrap();
        assert!(!result.is_fraud);
        assert_eq!(result.anomaly_score, 2.0);

        let seen = model.seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0][0], 4.0);
        assert_eq!(seen[0][2], 1.0);
    }

    #[test]
    fn test_inference_failure_is_wrapped() {
        let scorer = ModelScorer::new(identity_scaler(), Box::new(BrokenModel));
        let err = scorer.score(&features(1.0)).unwrap_err();
        assert_eq!(
            err,
            ScoringError::Prediction("X has 10 features, but model expects 11".to_string())
        );
        assert!(err.to_string().starts_with("Prediction error: "));
    }

    #[test]
    fn test_unexpected_label_rejected() {
        let scorer = ModelScorer::new(
            identity_scaler(),
            Box::new(FixedModel(ModelOutput { label: 0, score: 0.5 })),
        );
        assert!(scorer.score(&features(1.0)).is_err());
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let model = std::sync::Arc::new(CutoffModel::new(0.0));
        let scorer = ModelScorer::new(identity_scaler(), Box::new(model.clone()));
        let mut values = features(1.0).values;
        values[0] = f64::INFINITY;
        let err = scorer.score(&FeatureVector::from_values(values)).unwrap_err();

        assert!(err.to_string().contains("NaN"));
        assert!(model.seen.lock().is_empty());
    }
}
