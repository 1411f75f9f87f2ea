//! Exchange rate sources.
//!
//! The ledger asks a [`RateProvider`] for a fresh [`RateSnapshot`] on every
//! conversion or valuation. Nothing is cached between calls.

mod http;

pub use http::*;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{InvalidRate, MarketQuotes, NFT_USD_PLACEHOLDER, RateSnapshot};

#[derive(Error, Debug)]
pub enum RateError {
    #[error("Rate request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Rate source returned no data for {0}")]
    Missing(String),

    #[error("Rate {name} has an unusable value: {value}")]
    InvalidValue { name: String, value: String },

    #[error("Rate source unavailable: {0}")]
    Unavailable(String),
}

impl From<InvalidRate> for RateError {
    fn from(err: InvalidRate) -> Self {
        RateError::InvalidValue {
            name: err.name.to_string(),
            value: err.value.to_string(),
        }
    }
}

/// Source of exchange rate snapshots.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetch every rate the ledger needs. Fails as a whole if any rate is
    /// unavailable; callers never see a partial snapshot.
    async fn fetch_rates(&self) -> Result<RateSnapshot, RateError>;
}

#[async_trait]
impl<T: RateProvider + ?Sized> RateProvider for Box<T> {
    async fn fetch_rates(&self) -> Result<RateSnapshot, RateError> {
        (**self).fetch_rates().await
    }
}

/// Provider that always returns the same snapshot.
#[derive(Debug, Clone)]
pub struct FixedRates {
    snapshot: RateSnapshot,
}

impl FixedRates {
    pub fn new(snapshot: RateSnapshot) -> Self {
        Self { snapshot }
    }

    /// Build a fixed provider from market quotes.
    pub fn from_quotes(quotes: MarketQuotes) -> Result<Self, RateError> {
        Ok(Self::new(RateSnapshot::from_quotes(quotes, Utc::now())?))
    }

    /// Illustrative rates for offline use. Not market data.
    pub fn demo() -> Self {
        let usd_to_inr = Decimal::new(83, 0);
        Self::new(RateSnapshot {
            inr_to_usd: Decimal::new(12, 3),
            usd_to_inr,
            btc_usd: Decimal::new(60_000, 0),
            btc_inr: Decimal::new(4_980_000, 0),
            eth_usd: Decimal::new(3_000, 0),
            eth_inr: Decimal::new(249_000, 0),
            nft_usd: NFT_USD_PLACEHOLDER,
            nft_inr: NFT_USD_PLACEHOLDER * usd_to_inr,
            fetched_at: Utc::now(),
        })
    }

    pub fn snapshot(&self) -> &RateSnapshot {
        &self.snapshot
    }
}

#[async_trait]
impl RateProvider for FixedRates {
    async fn fetch_rates(&self) -> Result<RateSnapshot, RateError> {
        Ok(self.snapshot.clone())
    }
}
