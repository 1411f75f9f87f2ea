use thiserror::Error;

use crate::domain::{Amount, Currency, UserId};
use crate::rates::RateError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),

    #[error("Could not fetch exchange rates: {0}")]
    RateFetch(#[from] RateError),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Insufficient funds: {currency} balance {balance}, required {required}")]
    InsufficientFunds {
        currency: Currency,
        balance: Amount,
        required: Amount,
    },

    #[error("Cannot convert {0} to itself")]
    InvalidConversion(Currency),

    #[error("Unsupported conversion: {from} -> {to}")]
    UnsupportedConversion { from: Currency, to: Currency },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Conversion {from} -> {to} overflowed")]
    ConversionOverflow { from: Currency, to: Currency },

    #[error("Total value of user {0} overflowed")]
    ValuationOverflow(UserId),
}

impl AppError {
    /// True for errors caused by the request rather than the environment.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, AppError::Storage(_) | AppError::RateFetch(_))
    }
}
