//! Feature Derivation
//!
//! Turns one raw `/api/predict` body into the fixed 11-column vector the
//! scaler and anomaly model were fitted on.
//!
//! ## Rules
//! 1. `FEATURE_LAYOUT` order is the column order of the training matrix.
//!    The scaler binds by position, not by name.
//! 2. A single request carries no account history, so the history-based
//!    columns are constant placeholders. Changing them means changing the
//!    feature-engineering approach, and the model with it.

use serde_json::{Map, Value};
use thiserror::Error;

// ============================================================================
// FEATURE LAYOUT
// ============================================================================

/// Feature names in exact column order
pub const FEATURE_LAYOUT: &[&str] = &[
    "value_eth",                         // 0: transferred value
    "gas_price_eth",                     // 1: gas price paid
    "transaction_count",                 // 2: placeholder, 1
    "unique_addresses_interacted",       // 3: placeholder, 1
    "average_transaction_value",         // 4: = value_eth
    "gas_price_volatility",              // 5: placeholder, 0
    "median_gas_price",                  // 6: = gas_price_eth
    "repeated_to_addresses",             // 7: placeholder, 1
    "incoming_outgoing_ratio",           // 8: placeholder, 1
    "transaction_frequency",             // 9: placeholder, 1
    "average_time_between_transactions", // 10: placeholder, 0
];

/// Must match FEATURE_LAYOUT.len()
pub const FEATURE_COUNT: usize = 11;

pub const IDX_VALUE_ETH: usize = 0;
pub const IDX_GAS_PRICE_ETH: usize = 1;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("could not convert {field} to float: {value}")]
    NotNumeric { field: &'static str, value: String },
}

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// Derived features in `FEATURE_LAYOUT` order. Recomputed per request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn value_eth(&self) -> f64 {
        self.values[IDX_VALUE_ETH]
    }

    pub fn gas_price_eth(&self) -> f64 {
        self.values[IDX_GAS_PRICE_ETH]
    }
}

// ============================================================================
// DERIVATION
// ============================================================================

/// Build the feature vector for one raw transaction.
pub fn derive(raw: &Map<String, Value>) -> Result<FeatureVector, FeatureError> {
    let value_eth = read_float(raw, "value_eth")?;
    let gas_price_eth = read_float(raw, "gas_price_eth")?;

    Ok(FeatureVector::from_values([
        value_eth,
        gas_price_eth,
        1.0,
        1.0,
        value_eth,
        0.0,
        gas_price_eth,
        1.0,
        1.0,
        1.0,
        0.0,
    ]))
}

/// Absent fields default to 0.0. Numeric strings and booleans are coerced.
/// Results must be finite: the stored record has to serialize as a number.
fn read_float(raw: &Map<String, Value>, field: &'static str) -> Result<f64, FeatureError> {
    let not_numeric = |value: &Value| FeatureError::NotNumeric {
        field,
        value: value.to_string(),
    };

    match raw.get(field) {
        None => Ok(0.0),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| not_numeric(&Value::Number(n.clone()))),
        Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
        Some(v @ Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .ok_or_else(|| not_numeric(v)),
        Some(other) => Err(not_numeric(other)),
    }
}
