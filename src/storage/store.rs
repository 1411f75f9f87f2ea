use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{BalanceRecord, User};

/// Table-level persistence for the ledger.
///
/// Loads return a whole table in stored order; saves overwrite a whole table
/// and leave the other one untouched. Saving Users and then Balances is two
/// separate writes, so a crash in between can leave them out of step.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Create the backing store with empty tables if it does not exist yet.
    async fn ensure_store_exists(&self) -> Result<()>;

    async fn load_users(&self) -> Result<Vec<User>>;

    async fn load_balances(&self) -> Result<Vec<BalanceRecord>>;

    async fn save_users(&self, users: &[User]) -> Result<()>;

    async fn save_balances(&self, balances: &[BalanceRecord]) -> Result<()>;
}
