//! Fraud prediction handler

use axum::{body::Bytes, extract::State, Json};
use serde_json::{Map, Value};

use crate::{AppState, AppResult, AppError};
use crate::features;
use crate::models::{now_timestamp, NewTransaction, PredictionResult};

/// Score a submitted transaction and record it.
///
/// Nothing is appended unless both feature derivation and scoring succeed.
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<PredictionResult>> {
    let raw = parse_body(&body)?;
    let received = serde_json::Value::Object(raw.clone());
    tracing::debug!("Received data: {}", received);

    let features = features::derive(&raw)?;
    let prediction = state.scorer.score(&features)?;

    let stored = state
        .store
        .append(NewTransaction {
            from_address: address_field(&raw, "from_address"),
            to_address: address_field(&raw, "to_address"),
            value_eth: features.value_eth(),
            gas_price_eth: features.gas_price_eth(),
            is_fraud: prediction.is_fraud,
            timestamp: now_timestamp(),
        })
        .await?;

    tracing::info!(
        id = stored.id,
        value_eth = stored.value_eth,
        is_fraud = prediction.is_fraud,
        anomaly_score = prediction.anomaly_score,
        scorer = state.scorer.name(),
        "Transaction scored"
    );

    Ok(Json(prediction))
}

/// The body must be a JSON object; anything else is a 400
fn parse_body(body: &[u8]) -> AppResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::BadRequest("Request body is empty".to_string()));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::BadRequest("Request body must be a JSON object".to_string())),
    }
}

/// Missing or null → "", non-string values keep their JSON text
fn address_field(raw: &Map<String, Value>, key: &str) -> String {
    match raw.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_body_object() {
        let map = parse_body(br#"{"value_eth": 1.0}"#).unwrap();
        assert_eq!(map.get("value_eth"), Some(&json!(1.0)));
    }

    #[test]
    fn test_parse_body_rejects_empty_and_non_objects() {
        let bodies: [&[u8]; 6] = [b"", b"   ", b"not json", b"[1, 2]", b"42", b"null"];
        for body in bodies {
            match parse_body(body) {
                Err(AppError::BadRequest(msg)) => assert!(!msg.is_empty()),
                other => panic!("expected BadRequest for {:?}, got {:?}", body, other),
            }
        }
    }

    #[test]
    fn test_address_field() {
        let raw = json!({ "from_address": "0xabc", "to_address": 7, "other": null });
        let raw = raw.as_object().unwrap();

        assert_eq!(address_field(raw, "from_address"), "0xabc");
        assert_eq!(address_field(raw, "to_address"), "7");
        assert_eq!(address_field(raw, "other"), "");
        assert_eq!(address_field(raw, "missing"), "");
    }
}
