// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal_macros::dec;
use tempfile::TempDir;
use tradeledger::application::LedgerService;
use tradeledger::domain::{MarketQuotes, RateSnapshot};
use tradeledger::rates::{FixedRates, RateError, RateProvider};
use tradeledger::storage::{MemoryStore, SqliteStore};

/// Deterministic rates used across the test suite.
pub fn test_quotes() -> MarketQuotes {
    MarketQuotes {
        inr_to_usd: dec!(0.012),
        usd_to_inr: dec!(83),
        btc_usd: dec!(60000),
        btc_inr: dec!(5000000),
        eth_usd: dec!(3000),
        eth_inr: dec!(250000),
    }
}

pub fn test_rates() -> FixedRates {
    FixedRates::from_quotes(test_quotes()).unwrap()
}

pub fn test_snapshot() -> RateSnapshot {
    test_rates().snapshot().clone()
}

/// Helper to create a service over an in-memory store
pub fn memory_service() -> LedgerService<MemoryStore, FixedRates> {
    LedgerService::new(MemoryStore::new(), test_rates())
}

/// Helper to create a service over a temporary SQLite store
pub async fn sqlite_service() -> Result<(LedgerService<SqliteStore, FixedRates>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("ledger.db");
    let store = SqliteStore::create(db_path.to_str().unwrap()).await?;
    Ok((LedgerService::new(store, test_rates()), temp_dir))
}

/// Rate source that is always down.
pub struct UnavailableRates;

#[async_trait]
impl RateProvider for UnavailableRates {
    async fn fetch_rates(&self) -> Result<RateSnapshot, RateError> {
        Err(RateError::Unavailable("rate service is down".to_string()))
    }
}
