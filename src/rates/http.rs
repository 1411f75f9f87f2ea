use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::domain::{MarketQuotes, RateSnapshot};

use super::{RateError, RateProvider};

/// Endpoints and limits for the HTTP rate sources.
#[derive(Debug, Clone)]
pub struct RateConfig {
    /// Frankfurter-compatible fiat API (`/latest?from=..&to=..`).
    pub fiat_base_url: String,
    /// CoinGecko-compatible crypto API (`/simple/price`).
    pub crypto_base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            fiat_base_url: "https://api.frankfurter.app".to_string(),
            crypto_base_url: "https://api.coingecko.com/api/v3".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// `GET /latest?from=INR&to=USD`
#[derive(Debug, Deserialize)]
struct FiatResponse {
    rates: HashMap<String, f64>,
}

/// `GET /simple/price?ids=bitcoin,ethereum&vs_currencies=usd,inr`
type CryptoResponse = HashMap<String, HashMap<String, f64>>;

/// BTC and ETH spot prices in USD and INR.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CryptoPrices {
    pub btc_usd: Decimal,
    pub btc_inr: Decimal,
    pub eth_usd: Decimal,
    pub eth_inr: Decimal,
}

/// Rate provider that queries a fiat exchange API and a crypto price API
/// over HTTP on every call.
pub struct HttpRateProvider {
    http: Client,
    config: RateConfig,
}

impl HttpRateProvider {
    pub fn new(config: RateConfig) -> Result<Self, RateError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    #[instrument(skip(self))]
    async fn fetch_fiat(&self, from: &str, to: &str) -> Result<Decimal, RateError> {
        let url = format!(
            "{}/latest",
            self.config.fiat_base_url.trim_end_matches('/')
        );
        let body = self
            .http
            .get(&url)
            .query(&[("from", from), ("to", to)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let rate = parse_fiat_rate(&body, to)?;
        debug!(from, to, %rate, "Fetched fiat rate");
        Ok(rate)
    }

    #[instrument(skip(self))]
    async fn fetch_crypto(&self) -> Result<CryptoPrices, RateError> {
        let url = format!(
            "{}/simple/price",
            self.config.crypto_base_url.trim_end_matches('/')
        );
        let body = self
            .http
            .get(&url)
            .query(&[("ids", "bitcoin,ethereum"), ("vs_currencies", "usd,inr")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let prices = parse_crypto_prices(&body)?;
        debug!(?prices, "Fetched crypto prices");
        Ok(prices)
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn fetch_rates(&self) -> Result<RateSnapshot, RateError> {
        let inr_to_usd = self.fetch_fiat("INR", "USD").await?;
        let usd_to_inr = self.fetch_fiat("USD", "INR").await?;
        let crypto = self.fetch_crypto().await?;

        let quotes = MarketQuotes {
            inr_to_usd,
            usd_to_inr,
            btc_usd: crypto.btc_usd,
            btc_inr: crypto.btc_inr,
            eth_usd: crypto.eth_usd,
            eth_inr: crypto.eth_inr,
        };
        Ok(RateSnapshot::from_quotes(quotes, Utc::now())?)
    }
}

/// Extract the `to` rate from a fiat API response body.
pub fn parse_fiat_rate(body: &str, to: &str) -> Result<Decimal, RateError> {
    let response: FiatResponse = serde_json::from_str(body)?;
    let value = response
        .rates
        .get(to)
        .copied()
        .ok_or_else(|| RateError::Missing(format!("fiat rate {}", to)))?;
    to_decimal(to, value)
}

/// Extract BTC and ETH prices from a crypto API response body.
pub fn parse_crypto_prices(body: &str) -> Result<CryptoPrices, RateError> {
    let response: CryptoResponse = serde_json::from_str(body)?;

    let price = |asset: &str, quote: &str| -> Result<Decimal, RateError> {
        let value = response
            .get(asset)
            .and_then(|quotes| quotes.get(quote))
            .copied()
            .ok_or_else(|| RateError::Missing(format!("{} in {}", asset, quote)))?;
        to_decimal(&format!("{}/{}", asset, quote), value)
    };

    Ok(CryptoPrices {
        btc_usd: price("bitcoin", "usd")?,
        btc_inr: price("bitcoin", "inr")?,
        eth_usd: price("ethereum", "usd")?,
        eth_inr: price("ethereum", "inr")?,
    })
}

fn to_decimal(name: &str, value: f64) -> Result<Decimal, RateError> {
    Decimal::try_from(value).map_err(|_| RateError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}
