//! ONNX Runtime backend for the anomaly model
//!
//! The training pipeline exports its one-class detector as an ONNX graph with
//! one float input `[N, 11]` and two outputs: the `predict` label and the
//! `decision_function` score.

use std::fs;
use std::path::Path;

use ndarray::Array2;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::{DynValue, Value};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use super::model::{AnomalyModel, InferenceError, ModelOutput};
use super::ArtifactError;
use crate::features::FEATURE_COUNT;

pub struct OnnxAnomalyModel {
    // `Session::run` needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    label_output: String,
    score_output: String,
}

/// Hex-encoded SHA-256 of a byte slice
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Read the model file and compare it to the expected digest
pub fn read_verified(path: &Path, expected_sha256: Option<&str>) -> Result<Vec<u8>, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(expected) = expected_sha256 {
        let expected = expected.trim().to_ascii_lowercase();
        let actual = sha256_hex(&bytes);
        if actual != expected {
            return Err(ArtifactError::ChecksumMismatch {
                path: path.to_path_buf(),
                expected,
                actual,
            });
        }
        tracing::debug!(path = %path.display(), "Model checksum verified");
    }

    Ok(bytes)
}

impl OnnxAnomalyModel {
    pub fn load(
        path: &Path,
        expected_sha256: Option<&str>,
        label_output: &str,
        score_output: &str,
    ) -> Result<Self, ArtifactError> {
        tracing::info!("Loading ONNX model from: {}", path.display());

        let bytes = read_verified(path, expected_sha256)?;
        let model_err = |reason: String| ArtifactError::Model {
            path: path.to_path_buf(),
            reason,
        };

        let session = Session::builder()
            .map_err(|e| model_err(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| model_err(format!("Failed to set optimization: {}", e)))?
            .commit_from_memory(&bytes)
            .map_err(|e| model_err(format!("Failed to load model: {}", e)))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| model_err("model declares no inputs".to_string()))?;

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        for wanted in [label_output, score_output] {
            if !output_names.iter().any(|n| n == wanted) {
                return Err(model_err(format!(
                    "output '{}' not found (available: {:?})",
                    wanted, output_names
                )));
            }
        }

        tracing::info!(
            input = %input_name,
            label = %label_output,
            score = %score_output,
            bytes = bytes.len(),
            "ONNX model loaded successfully"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            label_output: label_output.to_string(),
            score_output: score_output.to_string(),
        })
    }
}

impl AnomalyModel for OnnxAnomalyModel {
    fn evaluate(&self, scaled: &[f64; FEATURE_COUNT]) -> Result<ModelOutput, InferenceError> {
        let input_data: Vec<f32> = scaled.iter().map(|v| *v as f32).collect();

        let input_array = Array2::<f32>::from_shape_vec((1, FEATURE_COUNT), input_data)
            .map_err(|e| InferenceError(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| InferenceError(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| InferenceError(format!("Inference failed: {}", e)))?;

        let label_value = outputs
            .get(self.label_output.as_str())
            .ok_or_else(|| InferenceError(format!("No output '{}'", self.label_output)))?;
        let score_value = outputs
            .get(self.score_output.as_str())
            .ok_or_else(|| InferenceError(format!("No output '{}'", self.score_output)))?;

        Ok(ModelOutput {
            label: first_label(label_value)?,
            score: first_score(score_value)?,
        })
    }
}

/// Labels are int64 in sklearn exports; some converters emit float
fn first_label(value: &DynValue) -> Result<i64, InferenceError> {
    if let Ok((_, data)) = value.try_extract_tensor::<i64>() {
        return label_from_i64(data);
    }

    let (_, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|e| InferenceError(format!("Extract label error: {}", e)))?;
    label_from_f32(data)
}

fn first_score(value: &DynValue) -> Result<f64, InferenceError> {
    let (_, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|e| InferenceError(format!("Extract score error: {}", e)))?;
    score_from_f32(data)
}

fn label_from_i64(data: &[i64]) -> Result<i64, InferenceError> {
    data.first()
        .copied()
        .ok_or_else(|| InferenceError("Empty label tensor".to_string()))
}

fn label_from_f32(data: &[f32]) -> Result<i64, InferenceError> {
    data.first()
        .map(|v| v.round() as i64)
        .ok_or_else(|| InferenceError("Empty label tensor".to_string()))
}

fn score_from_f32(data: &[f32]) -> Result<f64, InferenceError> {
    data.first()
        .map(|v| *v as f64)
        .ok_or_else(|| InferenceError("Empty score tensor".to_string()))
}
