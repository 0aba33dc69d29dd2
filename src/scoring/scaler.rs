//! Standard scaler fitted by the training pipeline
//!
//! Loaded from `{"mean": [...], "scale": [...]}`. Columns bind by position.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::ArtifactError;
use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT};

#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl StandardScaler {
    #[cfg(test)]
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, String> {
        let scaler = Self {
            mean,
            scale,
            feature_names: None,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Load and validate scaler parameters
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ArtifactError::NotFound(path.to_path_buf()));
        }

        let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let invalid = |reason: String| ArtifactError::InvalidScaler {
            path: path.to_path_buf(),
            reason,
        };

        let scaler: StandardScaler =
            serde_json::from_str(&raw).map_err(|e| invalid(e.to_string()))?;
        scaler.validate().map_err(invalid)?;

        tracing::info!(path = %path.display(), columns = scaler.mean.len(), "Scaler loaded");
        Ok(scaler)
    }

    fn validate(&self) -> Result<(), String> {
        if self.mean.len() != FEATURE_COUNT || self.scale.len() != FEATURE_COUNT {
            return Err(format!(
                "expected {} columns, got mean={} scale={}",
                FEATURE_COUNT,
                self.mean.len(),
                self.scale.len()
            ));
        }

        if self.mean.iter().chain(self.scale.iter()).any(|v| !v.is_finite()) {
            return Err("parameters must be finite".to_string());
        }

        if let Some(names) = &self.feature_names {
            if names.iter().map(String::as_str).ne(FEATURE_LAYOUT.iter().copied()) {
                return Err(format!(
                    "feature order {:?} does not match {:?}",
                    names, FEATURE_LAYOUT
                ));
            }
        }

        Ok(())
    }

    /// Column-wise `(x - mean) / scale`. A zero scale (constant training
    /// column) divides by 1.
    pub fn transform(&self, features: &FeatureVector) -> [f64; FEATURE_COUNT] {
        let mut scaled = [0.0; FEATURE_COUNT];
        for (i, x) in features.values.iter().enumerate() {
            let scale = if self.scale[i] == 0.0 { 1.0 } else { self.scale[i] };
            scaled[i] = (x - self.mean[i]) / scale;
        }
        scaled
    }
}
