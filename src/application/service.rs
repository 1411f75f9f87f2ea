use tracing::{debug, info};

use crate::domain::{Amount, BalanceRecord, ConversionTable, Currency, RateSnapshot, User, UserId};
use crate::rates::RateProvider;
use crate::storage::LedgerStore;

use super::AppError;

/// Application service providing the ledger's operations.
/// This is the primary interface for any client (CLI, shell, tests).
///
/// Every operation loads the tables it needs, validates, mutates in memory,
/// and writes whole tables back. No state is kept between calls.
pub struct LedgerService<S, R> {
    store: S,
    rates: R,
    routes: ConversionTable,
}

/// Result of a currency conversion
#[derive(Debug, Clone)]
pub struct Conversion {
    pub from: Currency,
    pub to: Currency,
    pub amount: Amount,
    pub converted: Amount,
    pub balance: BalanceRecord,
}

/// A user's holdings together with their approximate USD value
#[derive(Debug, Clone)]
pub struct BalanceView {
    pub user: User,
    pub balance: BalanceRecord,
    pub rates: RateSnapshot,
    pub total_usd: Amount,
}

impl<S: LedgerStore, R: RateProvider> LedgerService<S, R> {
    /// Create a new ledger service over the given store and rate source.
    pub fn new(store: S, rates: R) -> Self {
        Self {
            store,
            rates,
            routes: ConversionTable::standard(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn routes(&self) -> &ConversionTable {
        &self.routes
    }

    // ========================
    // User operations
    // ========================

    /// Register a new user with zero balances. Returns the created user.
    /// Names and emails are not required to be unique.
    pub async fn create_user(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<User, AppError> {
        let user = User::new(name, email);

        let mut users = self.store.load_users().await?;
        users.push(user.clone());
        self.store.save_users(&users).await?;

        let mut balances = self.store.load_balances().await?;
        balances.push(BalanceRecord::zeroed(user.uid));
        self.store.save_balances(&balances).await?;

        info!(uid = %user.uid, name = %user.name, "Created user");
        Ok(user)
    }

    /// List all users in stored order.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.store.load_users().await?)
    }

    /// List every balance record in stored order.
    pub async fn list_balances(&self) -> Result<Vec<BalanceRecord>, AppError> {
        Ok(self.store.load_balances().await?)
    }

    /// Look up a user by UID.
    pub async fn get_user(&self, uid: UserId) -> Result<User, AppError> {
        self.store
            .load_users()
            .await?
            .into_iter()
            .find(|u| u.uid == uid)
            .ok_or_else(|| AppError::UserNotFound(uid.to_string()))
    }

    // ========================
    // Balance operations
    // ========================

    /// Deposit `amount` of `currency` into a user's balance.
    pub async fn add_money(
        &self,
        uid: UserId,
        currency: Currency,
        amount: Amount,
    ) -> Result<BalanceRecord, AppError> {
        let mut balances = self.store.load_balances().await?;
        let record = find_balance(&mut balances, uid)?;
        validate_amount(amount)?;

        let field = record.get_mut(currency);
        *field = field.checked_add(amount).ok_or_else(|| {
            AppError::InvalidAmount(format!("{} {} is too large", amount, currency))
        })?;
        let updated = record.clone();

        self.store.save_balances(&balances).await?;
        info!(%uid, %currency, %amount, "Added money");
        Ok(updated)
    }

    /// Withdraw `amount` of `currency` from a user's balance.
    pub async fn withdraw_money(
        &self,
        uid: UserId,
        currency: Currency,
        amount: Amount,
    ) -> Result<BalanceRecord, AppError> {
        let mut balances = self.store.load_balances().await?;
        let record = find_balance(&mut balances, uid)?;
        validate_amount(amount)?;
        ensure_funds(record, currency, amount)?;

        *record.get_mut(currency) -= amount;
        let updated = record.clone();

        self.store.save_balances(&balances).await?;
        info!(%uid, %currency, %amount, "Withdrew money");
        Ok(updated)
    }

    /// Convert `amount` of `from` into `to` at current rates.
    /// Both balance changes are written in a single save.
    pub async fn convert(
        &self,
        uid: UserId,
        from: Currency,
        to: Currency,
        amount: Amount,
    ) -> Result<Conversion, AppError> {
        let mut balances = self.store.load_balances().await?;
        let record = find_balance(&mut balances, uid)?;
        validate_amount(amount)?;

        if from == to {
            return Err(AppError::InvalidConversion(from));
        }
        let formula = self
            .routes
            .route(from, to)
            .ok_or(AppError::UnsupportedConversion { from, to })?;
        ensure_funds(record, from, amount)?;

        let rates = self.rates.fetch_rates().await?;
        debug!(?rates, "Fetched rates for conversion");

        let converted = formula(amount, &rates)
            .ok_or(AppError::ConversionOverflow { from, to })?;
        let credited = record
            .get(to)
            .checked_add(converted)
            .ok_or(AppError::ConversionOverflow { from, to })?;

        *record.get_mut(from) -= amount;
        *record.get_mut(to) = credited;
        let updated = record.clone();

        self.store.save_balances(&balances).await?;
        info!(%uid, %from, %to, %amount, %converted, "Converted");

        Ok(Conversion {
            from,
            to,
            amount,
            converted,
            balance: updated,
        })
    }

    /// Show a user's balances and their approximate total in USD.
    pub async fn view_balance(&self, uid: UserId) -> Result<BalanceView, AppError> {
        let user = self.get_user(uid).await?;
        let balance = self
            .store
            .load_balances()
            .await?
            .into_iter()
            .find(|b| b.uid == uid)
            .ok_or_else(|| AppError::UserNotFound(uid.to_string()))?;

        let rates = self.rates.fetch_rates().await?;
        let total_usd = rates
            .total_usd(&balance)
            .ok_or(AppError::ValuationOverflow(uid))?;

        Ok(BalanceView {
            user,
            balance,
            rates,
            total_usd,
        })
    }

    // ========================
    // Rates
    // ========================

    /// Fetch a fresh rate snapshot.
    pub async fn current_rates(&self) -> Result<RateSnapshot, AppError> {
        Ok(self.rates.fetch_rates().await?)
    }
}

fn find_balance(
    balances: &mut [BalanceRecord],
    uid: UserId,
) -> Result<&mut BalanceRecord, AppError> {
    balances
        .iter_mut()
        .find(|b| b.uid == uid)
        .ok_or_else(|| AppError::UserNotFound(uid.to_string()))
}

fn validate_amount(amount: Amount) -> Result<(), AppError> {
    if amount < Amount::ZERO {
        return Err(AppError::InvalidAmount(
            "Amount must not be negative".to_string(),
        ));
    }
    Ok(())
}

fn ensure_funds(
    record: &BalanceRecord,
    currency: Currency,
    amount: Amount,
) -> Result<(), AppError> {
    if !record.covers(currency, amount) {
        return Err(AppError::InsufficientFunds {
            currency,
            balance: record.get(currency),
            required: amount,
        });
    }
    Ok(())
}
