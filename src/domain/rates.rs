use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Amount, BalanceRecord};

/// USD price of one NFT unit.
///
/// NFTs have no market-wide price, so this is a stub and not a valuation.
/// Anything priced through it is illustrative only.
pub const NFT_USD_PLACEHOLDER: Decimal = Decimal::ONE_HUNDRED;

/// Exchange rates captured at one instant. Fetched fresh for every
/// conversion or valuation, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub inr_to_usd: Decimal,
    pub usd_to_inr: Decimal,
    pub btc_usd: Decimal,
    pub btc_inr: Decimal,
    pub eth_usd: Decimal,
    pub eth_inr: Decimal,
    pub nft_usd: Decimal,
    pub nft_inr: Decimal,
    pub fetched_at: DateTime<Utc>,
}

/// Market quotes a rate source must provide; NFT rates are derived from these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketQuotes {
    pub inr_to_usd: Decimal,
    pub usd_to_inr: Decimal,
    pub btc_usd: Decimal,
    pub btc_inr: Decimal,
    pub eth_usd: Decimal,
    pub eth_inr: Decimal,
}

impl RateSnapshot {
    /// Build a snapshot from market quotes, synthesizing the NFT rates
    /// from the placeholder USD price. Rejects any non-positive rate.
    pub fn from_quotes(
        quotes: MarketQuotes,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, InvalidRate> {
        let nft_usd = NFT_USD_PLACEHOLDER;
        let nft_inr = nft_usd
            .checked_mul(quotes.usd_to_inr)
            .ok_or(InvalidRate {
                name: "nft_inr",
                value: quotes.usd_to_inr,
            })?;

        let snapshot = Self {
            inr_to_usd: quotes.inr_to_usd,
            usd_to_inr: quotes.usd_to_inr,
            btc_usd: quotes.btc_usd,
            btc_inr: quotes.btc_inr,
            eth_usd: quotes.eth_usd,
            eth_inr: quotes.eth_inr,
            nft_usd,
            nft_inr,
            fetched_at,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Every rate must be strictly positive; the conversion formulas divide by them.
    pub fn validate(&self) -> Result<(), InvalidRate> {
        for (name, value) in self.named_rates() {
            if value <= Decimal::ZERO {
                return Err(InvalidRate { name, value });
            }
        }
        Ok(())
    }

    pub fn named_rates(&self) -> [(&'static str, Decimal); 8] {
        [
            ("inr_to_usd", self.inr_to_usd),
            ("usd_to_inr", self.usd_to_inr),
            ("btc_usd", self.btc_usd),
            ("btc_inr", self.btc_inr),
            ("eth_usd", self.eth_usd),
            ("eth_inr", self.eth_inr),
            ("nft_usd", self.nft_usd),
            ("nft_inr", self.nft_inr),
        ]
    }

    /// Approximate total holdings in USD.
    ///
    /// The INR term divides by `inr_to_usd`, matching the figure the ledger
    /// has always reported. Returns `None` on arithmetic overflow.
    pub fn total_usd(&self, balance: &BalanceRecord) -> Option<Amount> {
        let inr = balance.inr.checked_div(self.inr_to_usd)?;
        let btc = balance.btc.checked_mul(self.btc_usd)?;
        let eth = balance.eth.checked_mul(self.eth_usd)?;
        let nft = balance.nft.checked_mul(self.nft_usd)?;

        inr.checked_add(balance.usd)?
            .checked_add(btc)?
            .checked_add(eth)?
            .checked_add(nft)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRate {
    pub name: &'static str,
    pub value: Decimal,
}

impl std::fmt::Display for InvalidRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rate {} must be positive, got {}", self.name, self.value)
    }
}

impl std::error::Error for InvalidRate {}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;

    fn quotes() -> MarketQuotes {
        MarketQuotes {
            inr_to_usd: dec!(0.012),
            usd_to_inr: dec!(83),
            btc_usd: dec!(60000),
            btc_inr: dec!(5000000),
            eth_usd: dec!(3000),
            eth_inr: dec!(250000),
        }
    }

    #[test]
    fn test_nft_rates_are_synthesized() {
        let snapshot = RateSnapshot::from_quotes(quotes(), Utc::now()).unwrap();
        assert_eq!(snapshot.nft_usd, dec!(100));
        assert_eq!(snapshot.nft_inr, dec!(8300));
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let mut q = quotes();
        q.eth_inr = Decimal::ZERO;

        let err = RateSnapshot::from_quotes(q, Utc::now()).unwrap_err();
        assert_eq!(err.name, "eth_inr");
    }

    #[test]
    fn test_negative_rate_is_rejected() {
        let mut q = quotes();
        q.inr_to_usd = dec!(-0.012);

        assert!(RateSnapshot::from_quotes(q, Utc::now()).is_err());
    }

    #[test]
    fn test_total_usd_formula() {
        let snapshot = RateSnapshot::from_quotes(quotes(), Utc::now()).unwrap();
        let mut balance = BalanceRecord::zeroed(Uuid::new_v4());
        balance.inr = dec!(120);
        balance.usd = dec!(10);
        balance.btc = dec!(0.5);
        balance.eth = dec!(2);
        balance.nft = dec!(1);

        // 120 / 0.012 + 10 + 0.5 * 60000 + 2 * 3000 + 1 * 100
        let expected = dec!(10000) + dec!(10) + dec!(30000) + dec!(6000) + dec!(100);
        assert_eq!(snapshot.total_usd(&balance), Some(expected));
    }

    #[test]
    fn test_total_usd_of_empty_balance_is_zero() {
        let snapshot = RateSnapshot::from_quotes(quotes(), Utc::now()).unwrap();
        let balance = BalanceRecord::zeroed(Uuid::new_v4());
        assert_eq!(snapshot.total_usd(&balance), Some(Decimal::ZERO));
    }
}
