//! Configuration module

use std::env;
use std::str::FromStr;

/// Which fraud scorer backs `/api/predict`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScorerKind {
    /// Fixed value threshold
    #[default]
    Threshold,
    /// Pre-trained anomaly model + scaler
    Model,
}

impl FromStr for ScorerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "threshold" => Ok(ScorerKind::Threshold),
            "model" => Ok(ScorerKind::Model),
            other => Err(format!("Unknown scorer '{}' (expected 'threshold' or 'model')", other)),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Scorer variant
    pub scorer: ScorerKind,

    /// Serialized anomaly model (ONNX)
    pub model_path: String,

    /// Fitted scaler parameters (JSON)
    pub scaler_path: String,

    /// Expected SHA-256 of the model file, hex encoded
    pub model_sha256: Option<String>,

    /// Model output holding the 1 / -1 label
    pub model_label_output: String,

    /// Model output holding the decision function
    pub model_score_output: String,

    /// PostgreSQL URL. In-memory store when unset.
    pub database_url: Option<String>,

    /// Log format (pretty, json)
    pub log_format: String,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            scorer: ScorerKind::Threshold,
            model_path: "model/model.onnx".to_string(),
            scaler_path: "model/scaler.json".to_string(),
            model_sha256: None,
            model_label_output: "label".to_string(),
            model_score_output: "scores".to_string(),
            database_url: None,
            log_format: "pretty".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let scorer = match lookup("SCORER") {
            Some(s) => s.parse()?,
            None => defaults.scorer,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),

            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            scorer,

            model_path: lookup("MODEL_PATH").unwrap_or(defaults.model_path),

            scaler_path: lookup("SCALER_PATH").unwrap_or(defaults.scaler_path),

            model_sha256: lookup("MODEL_SHA256").filter(|s| !s.trim().is_empty()),

            model_label_output: lookup("MODEL_LABEL_OUTPUT")
                .unwrap_or(defaults.model_label_output),

            model_score_output: lookup("MODEL_SCORE_OUTPUT")
                .unwrap_or(defaults.model_score_output),

            database_url: lookup("DATABASE_URL").filter(|s| !s.trim().is_empty()),

            log_format: lookup("LOG_FORMAT").unwrap_or(defaults.log_format),

            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
