//! Transaction Store
//!
//! Handlers only see `Arc<dyn TransactionStore>`. The in-memory store is the
//! default; PostgreSQL is used when `DATABASE_URL` is set.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;
use crate::models::{NewTransaction, Transaction};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Every stored transaction, in insertion order
    async fn list(&self) -> Result<Vec<Transaction>, StoreError>;

    /// Assign the next id (`len + 1`), append and return the stored record
    async fn append(&self, tx: NewTransaction) -> Result<Transaction, StoreError>;
}

/// Build the configured store, seeded with the sample transactions
pub async fn build(config: &Config) -> Result<Arc<dyn TransactionStore>, StoreError> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Database: {}", url.split('@').last().unwrap_or("***"));
            let store = PgStore::connect(url).await?;
            store.run_migrations().await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::info!("Using in-memory transaction store");
            Ok(Arc::new(MemoryStore::seeded()))
        }
    }
}
