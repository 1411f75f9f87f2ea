use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An exact decimal quantity of some currency, in whole units.
pub type Amount = Decimal;

/// The five balance fields every user holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Inr,
    Usd,
    Btc,
    Eth,
    /// Priced at a placeholder constant, see [`super::NFT_USD_PLACEHOLDER`].
    Nft,
}

impl Currency {
    /// All currencies, in balance column order.
    pub const ALL: [Currency; 5] = [
        Currency::Inr,
        Currency::Usd,
        Currency::Btc,
        Currency::Eth,
        Currency::Nft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Btc => "BTC",
            Currency::Eth => "ETH",
            Currency::Nft => "NFT",
        }
    }

    /// Decimal places used when showing a balance in this currency.
    pub fn display_scale(&self) -> u32 {
        match self {
            Currency::Btc | Currency::Eth => 6,
            Currency::Inr | Currency::Usd | Currency::Nft => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Currency {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INR" => Ok(Currency::Inr),
            "USD" => Ok(Currency::Usd),
            "BTC" => Ok(Currency::Btc),
            "ETH" => Ok(Currency::Eth),
            "NFT" => Ok(Currency::Nft),
            _ => Err(ParseCurrencyError(s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCurrencyError(pub String);

impl fmt::Display for ParseCurrencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown currency '{}' (expected INR/USD/BTC/ETH/NFT)",
            self.0
        )
    }
}

impl std::error::Error for ParseCurrencyError {}

/// Format an amount with the display precision of its currency.
/// Example: (Btc, 0.5) -> "0.500000", (Inr, 1000) -> "1000.00"
pub fn format_amount(currency: Currency, amount: Amount) -> String {
    format_scaled(amount, currency.display_scale())
}

/// Format an amount rounded to a fixed number of decimal places.
pub fn format_scaled(amount: Amount, scale: u32) -> String {
    format!("{:.*}", scale as usize, amount.round_dp(scale))
}

/// Parse a user-supplied decimal amount.
/// Example: "50.00" -> 50, "0.015" -> 0.015, "1e3" -> error
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::Empty);
    }
    Decimal::from_str(input).map_err(|_| ParseAmountError::InvalidFormat(input.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    Empty,
    InvalidFormat(String),
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::Empty => write!(f, "amount is empty"),
            ParseAmountError::InvalidFormat(s) => write!(f, "invalid amount '{}'", s),
        }
    }
}

impl std::error::Error for ParseAmountError {}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_currency_roundtrip() {
        for currency in Currency::ALL {
            let parsed: Currency = currency.as_str().parse().unwrap();
            assert_eq!(currency, parsed);
        }
    }

    #[test]
    fn test_currency_parse_is_case_insensitive() {
        assert_eq!("btc".parse::<Currency>(), Ok(Currency::Btc));
        assert_eq!(" Eth ".parse::<Currency>(), Ok(Currency::Eth));
        assert!("DOGE".parse::<Currency>().is_err());
        assert!("".parse::<Currency>().is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Currency::Inr, dec!(1000)), "1000.00");
        assert_eq!(format_amount(Currency::Usd, dec!(6.000)), "6.00");
        assert_eq!(format_amount(Currency::Btc, dec!(0.5)), "0.500000");
        assert_eq!(format_amount(Currency::Eth, dec!(0.1234567)), "0.123457");
        assert_eq!(format_amount(Currency::Nft, dec!(0)), "0.00");
    }

    #[test]
    fn test_format_scaled() {
        assert_eq!(format_scaled(dec!(6), 4), "6.0000");
        assert_eq!(format_scaled(dec!(0.00012345), 4), "0.0001");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("50.00"), Ok(dec!(50)));
        assert_eq!(parse_amount("50"), Ok(dec!(50)));
        assert_eq!(parse_amount(" 0.015 "), Ok(dec!(0.015)));
        assert_eq!(parse_amount("-3"), Ok(dec!(-3)));
    }

    #[test]
    fn test_parse_amount_invalid() {
        assert_eq!(parse_amount(""), Err(ParseAmountError::Empty));
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("12.34.56").is_err());
    }
}
