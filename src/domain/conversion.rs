use std::collections::HashMap;

use super::{Amount, Currency, RateSnapshot};

/// Computes a converted amount from a source amount and a rate snapshot.
/// Returns `None` on arithmetic overflow.
pub type RateFormula = fn(Amount, &RateSnapshot) -> Option<Amount>;

/// Directed lookup of conversion routes. A pair absent from the table is
/// unsupported; routes are not symmetric or transitive.
pub struct ConversionTable {
    routes: HashMap<(Currency, Currency), RateFormula>,
}

impl ConversionTable {
    /// The ledger's route set. BTC and ETH have no route between each other.
    pub fn standard() -> Self {
        use Currency::*;

        let routes: [((Currency, Currency), RateFormula); 18] = [
            // Fiat <-> fiat
            ((Inr, Usd), |a, r| a.checked_mul(r.inr_to_usd)),
            ((Usd, Inr), |a, r| a.checked_mul(r.usd_to_inr)),
            // Fiat -> crypto
            ((Inr, Btc), |a, r| a.checked_div(r.btc_inr)),
            ((Inr, Eth), |a, r| a.checked_div(r.eth_inr)),
            ((Usd, Btc), |a, r| a.checked_div(r.btc_usd)),
            ((Usd, Eth), |a, r| a.checked_div(r.eth_usd)),
            // Crypto -> fiat
            ((Btc, Inr), |a, r| a.checked_mul(r.btc_inr)),
            ((Btc, Usd), |a, r| a.checked_mul(r.btc_usd)),
            ((Eth, Inr), |a, r| a.checked_mul(r.eth_inr)),
            ((Eth, Usd), |a, r| a.checked_mul(r.eth_usd)),
            // Into NFT, crypto legs priced through USD
            ((Inr, Nft), |a, r| a.checked_div(r.nft_inr)),
            ((Usd, Nft), |a, r| a.checked_div(r.nft_usd)),
            ((Btc, Nft), |a, r| {
                a.checked_mul(r.btc_usd)?.checked_div(r.nft_usd)
            }),
            ((Eth, Nft), |a, r| {
                a.checked_mul(r.eth_usd)?.checked_div(r.nft_usd)
            }),
            // Out of NFT
            ((Nft, Inr), |a, r| a.checked_mul(r.nft_inr)),
            ((Nft, Usd), |a, r| a.checked_mul(r.nft_usd)),
            ((Nft, Btc), |a, r| {
                a.checked_mul(r.nft_usd)?.checked_div(r.btc_usd)
            }),
            ((Nft, Eth), |a, r| {
                a.checked_mul(r.nft_usd)?.checked_div(r.eth_usd)
            }),
        ];

        Self {
            routes: routes.into_iter().collect(),
        }
    }

    pub fn route(&self, from: Currency, to: Currency) -> Option<RateFormula> {
        self.routes.get(&(from, to)).copied()
    }

    /// All supported routes, sorted for stable display.
    pub fn pairs(&self) -> Vec<(Currency, Currency)> {
        let mut pairs: Vec<_> = self.routes.keys().copied().collect();
        pairs.sort();
        pairs
    }
}

impl Default for ConversionTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::MarketQuotes;

    fn snapshot() -> RateSnapshot {
        RateSnapshot::from_quotes(
            MarketQuotes {
                inr_to_usd: dec!(0.012),
                usd_to_inr: dec!(80),
                btc_usd: dec!(50000),
                btc_inr: dec!(4000000),
                eth_usd: dec!(2500),
                eth_inr: dec!(200000),
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn convert(from: Currency, to: Currency, amount: Amount) -> Amount {
        let formula = ConversionTable::standard().route(from, to).unwrap();
        formula(amount, &snapshot()).unwrap()
    }

    #[test]
    fn test_route_count() {
        assert_eq!(ConversionTable::standard().pairs().len(), 18);
    }

    #[test]
    fn test_crypto_cross_pairs_are_unsupported() {
        let table = ConversionTable::standard();
        assert!(table.route(Currency::Eth, Currency::Btc).is_none());
        assert!(table.route(Currency::Btc, Currency::Eth).is_none());
    }

    #[test]
    fn test_same_currency_has_no_route() {
        let table = ConversionTable::standard();
        for currency in Currency::ALL {
            assert!(table.route(currency, currency).is_none());
        }
    }

    #[test]
    fn test_fiat_routes() {
        assert_eq!(convert(Currency::Inr, Currency::Usd, dec!(500)), dec!(6));
        assert_eq!(convert(Currency::Usd, Currency::Inr, dec!(6)), dec!(480));
    }

    #[test]
    fn test_fiat_to_crypto_routes() {
        assert_eq!(convert(Currency::Inr, Currency::Btc, dec!(2000000)), dec!(0.5));
        assert_eq!(convert(Currency::Inr, Currency::Eth, dec!(100000)), dec!(0.5));
        assert_eq!(convert(Currency::Usd, Currency::Btc, dec!(25000)), dec!(0.5));
        assert_eq!(convert(Currency::Usd, Currency::Eth, dec!(5000)), dec!(2));
    }

    #[test]
    fn test_crypto_to_fiat_routes() {
        assert_eq!(convert(Currency::Btc, Currency::Inr, dec!(0.5)), dec!(2000000));
        assert_eq!(convert(Currency::Btc, Currency::Usd, dec!(0.5)), dec!(25000));
        assert_eq!(convert(Currency::Eth, Currency::Inr, dec!(2)), dec!(400000));
        assert_eq!(convert(Currency::Eth, Currency::Usd, dec!(2)), dec!(5000));
    }

    #[test]
    fn test_nft_routes() {
        // nft_usd = 100, nft_inr = 100 * 80 = 8000
        assert_eq!(convert(Currency::Inr, Currency::Nft, dec!(16000)), dec!(2));
        assert_eq!(convert(Currency::Usd, Currency::Nft, dec!(250)), dec!(2.5));
        assert_eq!(convert(Currency::Btc, Currency::Nft, dec!(0.01)), dec!(5));
        assert_eq!(convert(Currency::Eth, Currency::Nft, dec!(0.2)), dec!(5));

        assert_eq!(convert(Currency::Nft, Currency::Inr, dec!(2)), dec!(16000));
        assert_eq!(convert(Currency::Nft, Currency::Usd, dec!(2)), dec!(200));
        assert_eq!(convert(Currency::Nft, Currency::Btc, dec!(5)), dec!(0.01));
        assert_eq!(convert(Currency::Nft, Currency::Eth, dec!(5)), dec!(0.2));
    }

    #[test]
    fn test_overflow_yields_none() {
        let formula = ConversionTable::standard()
            .route(Currency::Btc, Currency::Inr)
            .unwrap();
        assert_eq!(formula(Amount::MAX, &snapshot()), None);
    }
}
