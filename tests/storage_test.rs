mod common;

use anyhow::Result;
use rust_decimal_macros::dec;
use sqlx::{Row, SqlitePool};
use tempfile::TempDir;
use tradeledger::application::{AppError, LedgerService};
use tradeledger::domain::{BalanceRecord, Currency, User};
use tradeledger::storage::{LedgerStore, SqliteStore};

use common::{sqlite_service, test_rates};

async fn column_names(pool: &SqlitePool, table: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(&format!("PRAGMA table_info({})", table))
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(|row| row.get("name")).collect())
}

#[tokio::test]
async fn test_create_makes_empty_tables() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("ledger.db");
    let store = SqliteStore::create(path.to_str().unwrap()).await?;

    assert!(path.exists());
    assert!(store.load_users().await?.is_empty());
    assert!(store.load_balances().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_ensure_store_exists_is_idempotent() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    let user = service.create_user("Alice", "a@x.com").await?;

    service.store().ensure_store_exists().await?;

    assert_eq!(service.list_users().await?, vec![user]);
    Ok(())
}

#[tokio::test]
async fn test_open_missing_file_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("missing.db");

    assert!(SqliteStore::open(path.to_str().unwrap()).await.is_err());
    assert!(!path.exists());
    Ok(())
}

#[tokio::test]
async fn test_corrupt_file_is_a_storage_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("corrupt.db");
    std::fs::write(&path, b"this is not a ledger, just some text padding it out")?;

    let result = match SqliteStore::open(path.to_str().unwrap()).await {
        Ok(store) => {
            let service = LedgerService::new(store, test_rates());
            service.list_users().await.map(|_| ())
        }
        Err(e) => Err(AppError::Storage(e)),
    };

    assert!(matches!(result, Err(AppError::Storage(_))));
    Ok(())
}

#[tokio::test]
async fn test_save_overwrites_one_table_only() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    let alice = service.create_user("Alice", "a@x.com").await?;
    let bob = service.create_user("Bob", "b@x.com").await?;
    let store = service.store();

    store.save_users(&[bob.clone()]).await?;

    assert_eq!(store.load_users().await?, vec![bob.clone()]);
    let balances = store.load_balances().await?;
    assert_eq!(balances.len(), 2);
    assert_eq!(balances[0].uid, alice.uid);
    assert_eq!(balances[1].uid, bob.uid);
    Ok(())
}

#[tokio::test]
async fn test_round_trip_preserves_order_and_precision() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    let store = service.store();

    let users: Vec<User> = ["Carol", "Alice", "Bob"]
        .iter()
        .map(|name| User::new(*name, format!("{}@x.com", name.to_lowercase())))
        .collect();
    let mut record = BalanceRecord::zeroed(users[0].uid);
    record.btc = dec!(0.000000012345678901);
    record.inr = dec!(1234567.89);

    store.save_users(&users).await?;
    store.save_balances(&[record.clone()]).await?;

    assert_eq!(store.load_users().await?, users);
    assert_eq!(store.load_balances().await?, vec![record]);
    Ok(())
}

#[tokio::test]
async fn test_operations_persist_across_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("ledger.db");
    let path = path.to_str().unwrap();

    let uid = {
        let service = LedgerService::new(SqliteStore::create(path).await?, test_rates());
        let user = service.create_user("Alice", "a@x.com").await?;
        service.add_money(user.uid, Currency::Inr, dec!(1000)).await?;
        service
            .convert(user.uid, Currency::Inr, Currency::Usd, dec!(500))
            .await?;
        user.uid
    };

    let service = LedgerService::new(SqliteStore::open(path).await?, test_rates());
    let view = service.view_balance(uid).await?;
    assert_eq!(view.user.name, "Alice");
    assert_eq!(view.balance.inr, dec!(500));
    assert_eq!(view.balance.usd, dec!(6));
    Ok(())
}

#[tokio::test]
async fn test_table_columns_follow_format() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("ledger.db");
    let path = path.to_str().unwrap();
    SqliteStore::create(path).await?;

    let pool = SqlitePool::connect(&format!("sqlite:{}", path)).await?;

    assert_eq!(column_names(&pool, "Users").await?, vec!["UID", "Name", "Email"]);
    assert_eq!(
        column_names(&pool, "Balances").await?,
        vec!["UID", "INR", "USD", "BTC", "ETH", "NFT"]
    );
    Ok(())
}
