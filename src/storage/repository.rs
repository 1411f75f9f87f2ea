use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{Amount, BalanceRecord, User};

use super::{LedgerStore, MIGRATION_001_INITIAL};

/// Ledger store backed by a single SQLite file holding the Users and
/// Balances tables.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("Failed to open ledger store {}", database_url))?;
        Ok(Self::new(pool))
    }

    /// Open an existing store file. Fails if the file is missing.
    pub async fn open(path: &str) -> Result<Self> {
        Self::connect(&format!("sqlite:{}", path)).await
    }

    /// Open the store file, creating it with empty tables on first run.
    pub async fn create(path: &str) -> Result<Self> {
        let store = Self::connect(&format!("sqlite:{}?mode=rwc", path)).await?;
        store.ensure_store_exists().await?;
        Ok(store)
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let uid: String = row.try_get("UID").context("Invalid UID column")?;

        Ok(User {
            uid: Uuid::parse_str(&uid).with_context(|| format!("Invalid user UID: {}", uid))?,
            name: row.try_get("Name").context("Invalid Name column")?,
            email: row.try_get("Email").context("Invalid Email column")?,
        })
    }

    fn row_to_balance(row: &sqlx::sqlite::SqliteRow) -> Result<BalanceRecord> {
        let uid: String = row.try_get("UID").context("Invalid UID column")?;

        Ok(BalanceRecord {
            uid: Uuid::parse_str(&uid)
                .with_context(|| format!("Invalid balance UID: {}", uid))?,
            inr: Self::decimal_column(row, "INR")?,
            usd: Self::decimal_column(row, "USD")?,
            btc: Self::decimal_column(row, "BTC")?,
            eth: Self::decimal_column(row, "ETH")?,
            nft: Self::decimal_column(row, "NFT")?,
        })
    }

    fn decimal_column(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<Amount> {
        let raw: String = row
            .try_get(column)
            .with_context(|| format!("Invalid {} column", column))?;
        Decimal::from_str(&raw).with_context(|| format!("Invalid {} amount: {}", column, raw))
    }
}

#[async_trait]
impl LedgerStore for SqliteStore {
    #[instrument(skip(self))]
    async fn ensure_store_exists(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT UID, Name, Email FROM Users ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load users")?;

        debug!(count = rows.len(), "Loaded users table");
        rows.iter().map(Self::row_to_user).collect()
    }

    #[instrument(skip(self))]
    async fn load_balances(&self) -> Result<Vec<BalanceRecord>> {
        let rows = sqlx::query(
            "SELECT UID, INR, USD, BTC, ETH, NFT FROM Balances ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load balances")?;

        debug!(count = rows.len(), "Loaded balances table");
        rows.iter().map(Self::row_to_balance).collect()
    }

    #[instrument(skip(self, users), fields(count = users.len()))]
    async fn save_users(&self, users: &[User]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin users transaction")?;

        sqlx::query("DELETE FROM Users")
            .execute(&mut *tx)
            .await
            .context("Failed to clear users table")?;

        for user in users {
            sqlx::query("INSERT INTO Users (UID, Name, Email) VALUES (?, ?, ?)")
                .bind(user.uid.to_string())
                .bind(&user.name)
                .bind(&user.email)
                .execute(&mut *tx)
                .await
                .context("Failed to save user")?;
        }

        tx.commit().await.context("Failed to commit users table")?;
        debug!("Saved users table");
        Ok(())
    }

    #[instrument(skip(self, balances), fields(count = balances.len()))]
    async fn save_balances(&self, balances: &[BalanceRecord]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin balances transaction")?;

        sqlx::query("DELETE FROM Balances")
            .execute(&mut *tx)
            .await
            .context("Failed to clear balances table")?;

        for record in balances {
            sqlx::query(
                r#"
                INSERT INTO Balances (UID, INR, USD, BTC, ETH, NFT)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record.uid.to_string())
            .bind(record.inr.to_string())
            .bind(record.usd.to_string())
            .bind(record.btc.to_string())
            .bind(record.eth.to_string())
            .bind(record.nft.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to save balance")?;
        }

        tx.commit().await.context("Failed to commit balances table")?;
        debug!("Saved balances table");
        Ok(())
    }
}
