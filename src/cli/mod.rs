mod shell;

pub use shell::Shell;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::application::LedgerService;
use crate::domain::{Currency, UserId, format_scaled, parse_amount};
use crate::rates::{FixedRates, HttpRateProvider, RateConfig, RateProvider};
use crate::storage::SqliteStore;

use shell::{write_balance_view, write_conversion, write_movement, write_users};

type CliService = LedgerService<SqliteStore, Box<dyn RateProvider>>;

/// Tradeledger - multi-currency personal ledger
#[derive(Parser)]
#[command(name = "tradeledger")]
#[command(about = "Track per-user balances in INR, USD, BTC, ETH and NFT, with conversion at live rates")]
#[command(version)]
pub struct Cli {
    /// Ledger store file path
    #[arg(
        short,
        long,
        env = "TRADELEDGER_DB",
        default_value = "tradeledger.db",
        global = true
    )]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub rates: RateArgs,

    /// Command to run (starts the interactive shell if omitted)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options for the exchange rate sources
#[derive(Args)]
pub struct RateArgs {
    /// Fiat exchange rate API base URL
    #[arg(long, env = "TRADELEDGER_FIAT_URL", global = true)]
    pub fiat_url: Option<String>,

    /// Crypto price API base URL
    #[arg(long, env = "TRADELEDGER_CRYPTO_URL", global = true)]
    pub crypto_url: Option<String>,

    /// Timeout for each rate request, in seconds
    #[arg(long, default_value = "10", global = true)]
    pub rates_timeout: u64,

    /// Use fixed demo rates instead of querying the rate APIs
    #[arg(long, global = true)]
    pub offline_rates: bool,
}

impl RateArgs {
    pub fn config(&self) -> RateConfig {
        let defaults = RateConfig::default();
        RateConfig {
            fiat_base_url: self.fiat_url.clone().unwrap_or(defaults.fiat_base_url),
            crypto_base_url: self.crypto_url.clone().unwrap_or(defaults.crypto_base_url),
            timeout: Duration::from_secs(self.rates_timeout),
        }
    }

    fn provider(&self) -> Result<Box<dyn RateProvider>> {
        if self.offline_rates {
            return Ok(Box::new(FixedRates::demo()));
        }
        let provider =
            HttpRateProvider::new(self.config()).context("Failed to build rate client")?;
        Ok(Box::new(provider))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the ledger store if it does not exist
    Init,

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),

    /// Add money to a user's balance
    Deposit {
        /// User UID
        uid: String,

        /// Currency: INR, USD, BTC, ETH, NFT
        currency: Currency,

        /// Amount to add (e.g., "50.00" or "0.015")
        amount: String,
    },

    /// Withdraw money from a user's balance
    Withdraw {
        /// User UID
        uid: String,

        /// Currency: INR, USD, BTC, ETH, NFT
        currency: Currency,

        /// Amount to withdraw
        amount: String,
    },

    /// Convert part of a balance into another currency at current rates
    Convert {
        /// User UID
        uid: String,

        /// Source currency
        from: Currency,

        /// Destination currency
        to: Currency,

        /// Amount of the source currency to convert
        amount: String,
    },

    /// Show a user's balances and approximate total value in USD
    Balance {
        /// User UID
        uid: String,
    },

    /// Show current exchange rates and supported conversions
    Rates,

    /// Export data to CSV or JSON
    Export {
        /// What to export: users, balances, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Start the interactive menu
    Shell,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a new user with zero balances
    Create {
        /// Display name
        name: String,

        /// Email address
        email: String,
    },

    /// List all users
    List,
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the level.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "tradeledger=debug,warn" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

impl Cli {
    async fn open_service(&self) -> Result<CliService> {
        let store = SqliteStore::open(&self.database).await.with_context(|| {
            format!(
                "Ledger store '{}' is missing or unreadable (run `tradeledger init` first)",
                self.database
            )
        })?;
        Ok(LedgerService::new(store, self.rates.provider()?))
    }

    async fn create_service(&self) -> Result<CliService> {
        let store = SqliteStore::create(&self.database)
            .await
            .with_context(|| format!("Failed to create ledger store '{}'", self.database))?;
        Ok(LedgerService::new(store, self.rates.provider()?))
    }

    pub async fn run(self) -> Result<()> {
        let Some(command) = &self.command else {
            return self.run_shell().await;
        };

        let mut out = std::io::stdout();

        match command {
            Commands::Init => {
                self.create_service().await?;
                println!("Ledger store initialized: {}", self.database);
            }

            Commands::User(user_cmd) => {
                let service = self.open_service().await?;
                match user_cmd {
                    UserCommands::Create { name, email } => {
                        let user = service.create_user(name.as_str(), email.as_str()).await?;
                        println!("User created. UID: {}", user.uid);
                    }
                    UserCommands::List => {
                        let users = service.list_users().await?;
                        write_users(&mut out, &users)?;
                    }
                }
            }

            Commands::Deposit {
                uid,
                currency,
                amount,
            } => {
                let service = self.open_service().await?;
                let amount = parse_amount_arg(amount)?;
                let record = service.add_money(parse_uid(uid)?, *currency, amount).await?;
                write_movement(&mut out, "Added", *currency, amount, &record)?;
            }

            Commands::Withdraw {
                uid,
                currency,
                amount,
            } => {
                let service = self.open_service().await?;
                let amount = parse_amount_arg(amount)?;
                let record = service
                    .withdraw_money(parse_uid(uid)?, *currency, amount)
                    .await?;
                write_movement(&mut out, "Withdrew", *currency, amount, &record)?;
            }

            Commands::Convert {
                uid,
                from,
                to,
                amount,
            } => {
                let service = self.open_service().await?;
                let amount = parse_amount_arg(amount)?;
                let conversion = service
                    .convert(parse_uid(uid)?, *from, *to, amount)
                    .await?;
                write_conversion(&mut out, &conversion)?;
            }

            Commands::Balance { uid } => {
                let service = self.open_service().await?;
                let view = service.view_balance(parse_uid(uid)?).await?;
                write_balance_view(&mut out, &view)?;
            }

            Commands::Rates => {
                let service = self.open_service().await?;
                run_rates_command(&service).await?;
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = self.open_service().await?;
                run_export_command(&service, export_type, output.as_deref()).await?;
            }

            Commands::Shell => self.run_shell().await?,
        }

        Ok(())
    }

    async fn run_shell(&self) -> Result<()> {
        let service = self.create_service().await?;
        let stdin = std::io::stdin();
        Shell::new(&service, stdin.lock(), std::io::stdout())
            .run()
            .await
    }
}

/// UIDs are opaque, so text that is not a UUID names no user.
fn parse_uid(raw: &str) -> Result<UserId> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| crate::application::AppError::UserNotFound(raw.trim().to_string()).into())
}

fn parse_amount_arg(raw: &str) -> Result<crate::domain::Amount> {
    parse_amount(raw).context("Invalid amount format. Use '50.00' or '0.015'")
}

async fn run_rates_command(service: &CliService) -> Result<()> {
    let rates = service.current_rates().await?;

    println!(
        "Rates fetched at {}",
        rates.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("{:<12} {:>20}", "RATE", "VALUE");
    println!("{}", "-".repeat(33));
    for (name, value) in rates.named_rates() {
        println!("{:<12} {:>20}", name, format_scaled(value, 6));
    }
    println!();
    println!("NFT rates are a fixed placeholder, not market prices.");

    let routes: Vec<String> = service
        .routes()
        .pairs()
        .into_iter()
        .map(|(from, to)| format!("{}->{}", from, to))
        .collect();
    println!("Supported conversions: {}", routes.join(", "));
    Ok(())
}

async fn run_export_command(
    service: &CliService,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(service);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "users" => {
            let count = exporter.export_users_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} users", count);
            }
        }
        "balances" => {
            let count = exporter.export_balances_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} balances", count);
            }
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported full ledger: {} users, {} balances",
                    snapshot.users.len(),
                    snapshot.balances.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown export type '{}'. Valid types: users, balances, full",
                export_type
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const UID: &str = "6f1c1a52-7a0e-4a8e-9a55-0c7f4b1f2d3e";

    #[test]
    fn test_database_flag_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tradeledger", "deposit", UID, "INR", "10", "-d", "other.db",
        ])
        .unwrap();

        assert_eq!(cli.database, "other.db");
        assert!(matches!(
            cli.command,
            Some(Commands::Deposit {
                currency: Currency::Inr,
                ..
            })
        ));
    }

    #[test]
    fn test_database_flag_before_subcommand() {
        let cli = Cli::try_parse_from(["tradeledger", "--database", "a.db", "balance", UID]).unwrap();
        assert_eq!(cli.database, "a.db");
    }
}
