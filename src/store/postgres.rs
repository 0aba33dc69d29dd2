//! PostgreSQL transaction store - connection, schema and queries

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgConnection, PgPool};

use super::{StoreError, TransactionStore};
use crate::models::{seed_transactions, NewTransaction, Transaction};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create database connection pool
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Apply schema and insert the sample rows into an empty table.
    ///
    /// The emptiness check and the seed inserts share one locked transaction,
    /// so concurrent starts seed at most once.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA_SQL)
            .execute(&self.pool)
            .await?;

        let mut db_tx = self.pool.begin().await?;
        lock_table(&mut db_tx).await?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(&mut *db_tx)
            .await?;

        if count == 0 {
            for tx in seed_transactions() {
                insert_next(&mut db_tx, &tx).await?;
            }
            tracing::info!("Seeded transactions table");
        }

        db_tx.commit().await?;

        tracing::info!("Database schema applied successfully");
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for PgStore {
    async fn list(&self) -> Result<Vec<Transaction>, StoreError> {
        let rows = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, from_address, to_address, value_eth, gas_price_eth, is_fraud, "timestamp"
            FROM transactions
            ORDER BY id ASC
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn append(&self, tx: NewTransaction) -> Result<Transaction, StoreError> {
        let mut db_tx = self.pool.begin().await?;
        lock_table(&mut db_tx).await?;
        let stored = insert_next(&mut db_tx, &tx).await?;
        db_tx.commit().await?;

        Ok(stored)
    }
}

/// Serialize writers so COUNT(*) + 1 stays unique
async fn lock_table(conn: &mut PgConnection) -> Result<(), StoreError> {
    sqlx::query("LOCK TABLE transactions IN EXCLUSIVE MODE")
        .execute(conn)
        .await?;
    Ok(())
}

/// Insert with id = row count + 1. Caller must hold the table lock.
async fn insert_next(conn: &mut PgConnection, tx: &NewTransaction) -> Result<Transaction, StoreError> {
    let stored = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (id, from_address, to_address, value_eth, gas_price_eth, is_fraud, "timestamp")
        SELECT COUNT(*) + 1, $1::TEXT, $2::TEXT, $3::DOUBLE PRECISION, $4::DOUBLE PRECISION, $5::BOOLEAN, $6::TEXT
        FROM transactions
        RETURNING id, from_address, to_address, value_eth, gas_price_eth, is_fraud, "timestamp"
        "#
    )
    .bind(&tx.from_address)
    .bind(&tx.to_address)
    .bind(tx.value_eth)
    .bind(tx.gas_price_eth)
    .bind(tx.is_fraud)
    .bind(&tx.timestamp)
    .fetch_one(conn)
    .await?;

    Ok(stored)
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id BIGINT PRIMARY KEY,
    from_address TEXT NOT NULL,
    to_address TEXT NOT NULL,
    value_eth DOUBLE PRECISION NOT NULL,
    gas_price_eth DOUBLE PRECISION NOT NULL,
    is_fraud BOOLEAN NOT NULL,
    "timestamp" TEXT NOT NULL
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    /// Runs only when TEST_DATABASE_URL points at a disposable database.
    async fn test_store() -> Option<PgStore> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let store = PgStore::connect(&url).await.unwrap();
        sqlx::query("DROP TABLE IF EXISTS transactions")
            .execute(&store.pool)
            .await
            .unwrap();
        Some(store)
    }

    #[tokio::test]
    async fn test_concurrent_migrations_seed_once() {
        let Some(store) = test_store().await else { return };

        sqlx::query(SCHEMA_SQL).execute(&store.pool).await.unwrap();
        let (a, b, c) = tokio::join!(
            store.run_migrations(),
            store.run_migrations(),
            store.run_migrations()
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        let rows = store.list().await.unwrap();
        assert_eq!(rows.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(rows[0].from_address, "0x123abc...");

        let stored = store.append(seed_transactions().remove(0)).await.unwrap();
        assert_eq!(stored.id, 3);

        // A restart on a non-empty table leaves it alone
        store.run_migrations().await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 3);
    }
}
