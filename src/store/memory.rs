//! In-memory transaction log

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{StoreError, TransactionStore};
use crate::models::{seed_transactions, NewTransaction, Transaction};

#[derive(Debug, Default)]
pub struct MemoryStore {
    transactions: Mutex<Vec<Transaction>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the two sample transactions
    pub fn seeded() -> Self {
        let store = Self::new();
        for tx in seed_transactions() {
            store.push(tx);
        }
        store
    }

    // id assignment and push under one lock
    fn push(&self, tx: NewTransaction) -> Transaction {
        let mut transactions = self.transactions.lock();
        let stored = tx.with_id(transactions.len() as i64 + 1);
        transactions.push(stored.clone());
        stored
    }
}

#[cfg(test)]
impl MemoryStore {
    pub fn len(&self) -> usize {
        self.transactions.lock().len()
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Transaction>, StoreError> {
        Ok(self.transactions.lock().clone())
    }

    async fn append(&self, tx: NewTransaction) -> Result<Transaction, StoreError> {
        Ok(self.push(tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sample(value_eth: f64) -> NewTransaction {
        NewTransaction {
            from_address: "0xaaa".to_string(),
            to_address: "0xbbb".to_string(),
            value_eth,
            gas_price_eth: 0.0001,
            is_fraud: value_eth > 5.0,
            timestamp: "2024-03-12T11:00:00".to_string(),
        }
    }

    #[test]
    fn test_seeded_contents() {
        let store = MemoryStore::seeded();
        let all = tokio_test::block_on(store.list()).unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, 1);
        assert_eq!(all[0].from_address, "0x123abc...");
        assert!(!all[0].is_fraud);
        assert_eq!(all[1].id, 2);
        assert_eq!(all[1].value_eth, 10.0);
        assert!(all[1].is_fraud);
    }

    #[tokio::test]
    async fn test_append_assigns_next_id() {
        let store = MemoryStore::seeded();
        let stored = store.append(sample(1.0)).await.unwrap();

        assert_eq!(stored.id, 3);
        assert_eq!(store.list().await.unwrap().last(), Some(&stored));
    }

    #[tokio::test]
    async fn test_n_appends_keep_order() {
        let store = MemoryStore::seeded();
        for i in 0..10 {
            store.append(sample(i as f64)).await.unwrap();
        }

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 12);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(all[2].value_eth, 0.0);
        assert_eq!(all[11].value_eth, 9.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_get_unique_ids() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.append(sample(i as f64)).await.unwrap().id })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();

        assert_eq!(ids, (1..=64).collect::<Vec<i64>>());
        assert_eq!(store.len(), 64);
    }
}
