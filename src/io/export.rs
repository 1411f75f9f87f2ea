use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{BalanceRecord, Currency, User};
use crate::rates::RateProvider;
use crate::storage::LedgerStore;

/// Full store snapshot for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub users: Vec<User>,
    pub balances: Vec<BalanceRecord>,
}

/// Exporter for writing ledger tables in formats other tools can read.
/// Column names and order match the store tables.
pub struct Exporter<'a, S, R> {
    service: &'a LedgerService<S, R>,
}

impl<'a, S: LedgerStore, R: RateProvider> Exporter<'a, S, R> {
    pub fn new(service: &'a LedgerService<S, R>) -> Self {
        Self { service }
    }

    /// Export the Users table to CSV format
    pub async fn export_users_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let users = self.service.list_users().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["UID", "Name", "Email"])?;

        for user in &users {
            csv_writer.write_record([user.uid.to_string(), user.name.clone(), user.email.clone()])?;
        }

        csv_writer.flush()?;
        Ok(users.len())
    }

    /// Export the Balances table to CSV format
    pub async fn export_balances_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let balances = self.service.list_balances().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec!["UID"];
        header.extend(Currency::ALL.iter().map(|c| c.as_str()));
        csv_writer.write_record(&header)?;

        for record in &balances {
            let mut row = vec![record.uid.to_string()];
            row.extend(record.entries().map(|(_, amount)| amount.to_string()));
            csv_writer.write_record(&row)?;
        }

        csv_writer.flush()?;
        Ok(balances.len())
    }

    /// Export both tables as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            users: self.service.list_users().await?,
            balances: self.service.list_balances().await?,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
