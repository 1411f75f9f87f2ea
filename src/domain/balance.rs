use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Amount, Currency, UserId};

/// One row of the Balances table: a user's holdings in every currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    #[serde(rename = "UID")]
    pub uid: UserId,
    #[serde(rename = "INR")]
    pub inr: Amount,
    #[serde(rename = "USD")]
    pub usd: Amount,
    #[serde(rename = "BTC")]
    pub btc: Amount,
    #[serde(rename = "ETH")]
    pub eth: Amount,
    #[serde(rename = "NFT")]
    pub nft: Amount,
}

impl BalanceRecord {
    /// A zero balance in every currency, created alongside each new user.
    pub fn zeroed(uid: UserId) -> Self {
        Self {
            uid,
            inr: Decimal::ZERO,
            usd: Decimal::ZERO,
            btc: Decimal::ZERO,
            eth: Decimal::ZERO,
            nft: Decimal::ZERO,
        }
    }

    pub fn get(&self, currency: Currency) -> Amount {
        match currency {
            Currency::Inr => self.inr,
            Currency::Usd => self.usd,
            Currency::Btc => self.btc,
            Currency::Eth => self.eth,
            Currency::Nft => self.nft,
        }
    }

    pub fn get_mut(&mut self, currency: Currency) -> &mut Amount {
        match currency {
            Currency::Inr => &mut self.inr,
            Currency::Usd => &mut self.usd,
            Currency::Btc => &mut self.btc,
            Currency::Eth => &mut self.eth,
            Currency::Nft => &mut self.nft,
        }
    }

    /// Returns true if the field holds at least `amount`.
    pub fn covers(&self, currency: Currency, amount: Amount) -> bool {
        self.get(currency) >= amount
    }

    /// Iterate fields in column order.
    pub fn entries(&self) -> impl Iterator<Item = (Currency, Amount)> + '_ {
        Currency::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}
