use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::domain::{BalanceRecord, User};

use super::LedgerStore;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    balances: Vec<BalanceRecord>,
    saves: usize,
}

/// In-memory ledger store with the same whole-table semantics as the
/// SQLite store. Used for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of table saves performed so far.
    pub fn save_count(&self) -> usize {
        self.tables.lock().map(|t| t.saves).unwrap_or_default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| anyhow!("In-memory store lock poisoned"))?;
        Ok(f(&mut tables))
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn ensure_store_exists(&self) -> Result<()> {
        Ok(())
    }

    async fn load_users(&self) -> Result<Vec<User>> {
        self.with(|t| t.users.clone())
    }

    async fn load_balances(&self) -> Result<Vec<BalanceRecord>> {
        self.with(|t| t.balances.clone())
    }

    async fn save_users(&self, users: &[User]) -> Result<()> {
        self.with(|t| {
            t.users = users.to_vec();
            t.saves += 1;
        })
    }

    async fn save_balances(&self, balances: &[BalanceRecord]) -> Result<()> {
        self.with(|t| {
            t.balances = balances.to_vec();
            t.saves += 1;
        })
    }
}
