//! Transaction model

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored transaction record. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: i64,
    pub from_address: String,
    pub to_address: String,
    pub value_eth: f64,
    pub gas_price_eth: f64,
    pub is_fraud: bool,
    pub timestamp: String,
}

/// A transaction that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub from_address: String,
    pub to_address: String,
    pub value_eth: f64,
    pub gas_price_eth: f64,
    pub is_fraud: bool,
    pub timestamp: String,
}

impl NewTransaction {
    pub fn with_id(self, id: i64) -> Transaction {
        Transaction {
            id,
            from_address: self.from_address,
            to_address: self.to_address,
            value_eth: self.value_eth,
            gas_price_eth: self.gas_price_eth,
            is_fraud: self.is_fraud,
            timestamp: self.timestamp,
        }
    }
}

/// Render a timestamp the way the seed records are written (ISO-8601, no offset)
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Server-side timestamp for a newly scored transaction
pub fn now_timestamp() -> String {
    format_timestamp(Local::now().naive_local())
}

/// Sample records every store starts with
pub fn seed_transactions() -> Vec<NewTransaction> {
    vec![
        NewTransaction {
            from_address: "0x123abc...".to_string(),
            to_address: "0x456def...".to_string(),
            value_eth: 1.5,
            gas_price_eth: 0.0002,
            is_fraud: false,
            timestamp: "2024-03-12T10:00:00".to_string(),
        },
        NewTransaction {
            from_address: "0x789ghi...".to_string(),
            to_address: "0xjklmno...".to_string(),
            value_eth: 10.0,
            gas_price_eth: 0.0003,
            is_fraud: true,
            timestamp: "2024-03-12T10:05:00".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_timestamp_format() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 12)
            .unwrap()
            .and_hms_micro_opt(10, 0, 0, 250)
            .unwrap();
        assert_eq!(format_timestamp(ts), "2024-03-12T10:00:00.000250");
    }

    #[test]
    fn test_now_timestamp_parses_back() {
        let ts = now_timestamp();
        assert!(NaiveDateTime::parse_from_str(&ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
    }

    #[test]
    fn test_serialized_field_names() {
        let tx = seed_transactions().remove(0).with_id(1);
        let value = serde_json::to_value(&tx).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["from_address", "gas_price_eth", "id", "is_fraud", "timestamp", "to_address", "value_eth"]
        );
        assert_eq!(value["value_eth"], 1.5);
        assert_eq!(value["is_fraud"], false);
    }
}
