//! Fraud Scoring
//!
//! Two interchangeable scorers behind one trait, picked at startup by
//! `SCORER`. Their numeric behaviour is kept separate and is never blended.

pub mod threshold;
pub mod scaler;
pub mod model;
pub mod onnx;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{Config, ScorerKind};
use crate::features::FeatureVector;
use crate::models::PredictionResult;

pub use model::ModelScorer;
pub use threshold::ThresholdScorer;

// ============================================================================
// ERRORS
// ============================================================================

/// Per-request scoring failure. Not retryable.
#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("Prediction error: {0}")]
    Prediction(String),
}

/// Startup failure while acquiring model artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scaler {}: {reason}", path.display())]
    InvalidScaler { path: PathBuf, reason: String },

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("failed to load model {}: {reason}", path.display())]
    Model { path: PathBuf, reason: String },
}

// ============================================================================
// SCORER TRAIT
// ============================================================================

pub trait FraudScorer: Send + Sync {
    /// Short identifier reported by `/health`
    fn name(&self) -> &'static str;

    fn score(&self, features: &FeatureVector) -> Result<PredictionResult, ScoringError>;
}

/// Build the configured scorer. Model artifacts are loaded here, before the
/// server accepts traffic.
pub fn build(config: &Config) -> Result<Arc<dyn FraudScorer>, ArtifactError> {
    match config.scorer {
        ScorerKind::Threshold => {
            tracing::info!("Using threshold scorer");
            Ok(Arc::new(ThresholdScorer::default()))
        }
        ScorerKind::Model => {
            let scorer = ModelScorer::load(config)?;
            tracing::info!(
                model = %config.model_path,
                scaler = %config.scaler_path,
                "Using anomaly model scorer"
            );
            Ok(Arc::new(scorer))
        }
    }
}
