use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::Result;
use tracing::warn;
use uuid::Uuid;

use crate::application::{AppError, BalanceView, Conversion, LedgerService};
use crate::domain::{
    Amount, BalanceRecord, Currency, User, UserId, format_amount, format_scaled, parse_amount,
};
use crate::rates::RateProvider;
use crate::storage::LedgerStore;

const MENU: &str = "
1. New User
2. Add Money
3. Withdraw Money
4. Convert Currency
5. View Balance
6. Exit
";

/// Interactive menu loop over a ledger service.
///
/// Reads one line per prompt. Every failed operation is reported and the
/// loop continues; end of input behaves like choosing Exit.
pub struct Shell<'a, S, R, I, O> {
    service: &'a LedgerService<S, R>,
    input: I,
    output: O,
}

/// Outcome of reading one field of an operation.
enum Field<T> {
    Value(T),
    Rejected,
    Eof,
}

impl<'a, S, R, I, O> Shell<'a, S, R, I, O>
where
    S: LedgerStore,
    R: RateProvider,
    I: BufRead,
    O: Write,
{
    pub fn new(service: &'a LedgerService<S, R>, input: I, output: O) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        writeln!(self.output, "Welcome to Tradeledger")?;

        loop {
            write!(self.output, "{}", MENU)?;
            let Some(choice) = self.prompt("Select option: ")? else {
                break;
            };

            let keep_going = match choice.trim() {
                "1" => self.new_user().await?,
                "2" => self.add_money().await?,
                "3" => self.withdraw_money().await?,
                "4" => self.convert().await?,
                "5" => self.view_balance().await?,
                "6" => false,
                _ => {
                    writeln!(self.output, "Invalid choice.")?;
                    true
                }
            };

            if !keep_going {
                break;
            }
        }

        writeln!(self.output, "Exiting. Bye!")?;
        self.output.flush()?;
        Ok(())
    }

    async fn new_user(&mut self) -> Result<bool> {
        let Some(name) = self.prompt("Enter Name: ")? else {
            return Ok(false);
        };
        let Some(email) = self.prompt("Enter Email: ")? else {
            return Ok(false);
        };

        let result = self.service.create_user(name.trim(), email.trim()).await;
        match result {
            Ok(user) => writeln!(self.output, "User created. UID: {}", user.uid)?,
            Err(e) => self.report(&e)?,
        }
        Ok(true)
    }

    async fn add_money(&mut self) -> Result<bool> {
        let (uid, currency, amount) = match self.read_movement()? {
            Field::Value(v) => v,
            Field::Rejected => return Ok(true),
            Field::Eof => return Ok(false),
        };

        match self.service.add_money(uid, currency, amount).await {
            Ok(record) => write_movement(&mut self.output, "Added", currency, amount, &record)?,
            Err(e) => self.report(&e)?,
        }
        Ok(true)
    }

    async fn withdraw_money(&mut self) -> Result<bool> {
        let (uid, currency, amount) = match self.read_movement()? {
            Field::Value(v) => v,
            Field::Rejected => return Ok(true),
            Field::Eof => return Ok(false),
        };

        match self.service.withdraw_money(uid, currency, amount).await {
            Ok(record) => {
                write_movement(&mut self.output, "Withdrew", currency, amount, &record)?
            }
            Err(e) => self.report(&e)?,
        }
        Ok(true)
    }

    async fn convert(&mut self) -> Result<bool> {
        let uid = match self.read_uid()? {
            Field::Value(v) => v,
            Field::Rejected => return Ok(true),
            Field::Eof => return Ok(false),
        };
        let from = match self.read_parsed::<Currency>("From Currency (INR/USD/BTC/ETH/NFT): ")? {
            Field::Value(v) => v,
            Field::Rejected => return Ok(true),
            Field::Eof => return Ok(false),
        };
        let to = match self.read_parsed::<Currency>("To Currency (INR/USD/BTC/ETH/NFT): ")? {
            Field::Value(v) => v,
            Field::Rejected => return Ok(true),
            Field::Eof => return Ok(false),
        };
        let amount = match self.read_amount()? {
            Field::Value(v) => v,
            Field::Rejected => return Ok(true),
            Field::Eof => return Ok(false),
        };

        match self.service.convert(uid, from, to, amount).await {
            Ok(conversion) => write_conversion(&mut self.output, &conversion)?,
            Err(e) => self.report(&e)?,
        }
        Ok(true)
    }

    async fn view_balance(&mut self) -> Result<bool> {
        let uid = match self.read_uid()? {
            Field::Value(v) => v,
            Field::Rejected => return Ok(true),
            Field::Eof => return Ok(false),
        };

        match self.service.view_balance(uid).await {
            Ok(view) => write_balance_view(&mut self.output, &view)?,
            Err(e) => self.report(&e)?,
        }
        Ok(true)
    }

    fn read_movement(&mut self) -> Result<Field<(UserId, Currency, Amount)>> {
        let uid = match self.read_uid()? {
            Field::Value(v) => v,
            Field::Rejected => return Ok(Field::Rejected),
            Field::Eof => return Ok(Field::Eof),
        };
        let currency = match self.read_parsed::<Currency>("Currency (INR/USD/BTC/ETH/NFT): ")? {
            Field::Value(v) => v,
            Field::Rejected => return Ok(Field::Rejected),
            Field::Eof => return Ok(Field::Eof),
        };
        let amount = match self.read_amount()? {
            Field::Value(v) => v,
            Field::Rejected => return Ok(Field::Rejected),
            Field::Eof => return Ok(Field::Eof),
        };
        Ok(Field::Value((uid, currency, amount)))
    }

    /// UIDs are opaque: text that is not a UUID cannot name a user.
    fn read_uid(&mut self) -> Result<Field<UserId>> {
        let Some(raw) = self.prompt("Enter UID: ")? else {
            return Ok(Field::Eof);
        };
        match Uuid::parse_str(raw.trim()) {
            Ok(uid) => Ok(Field::Value(uid)),
            Err(_) => {
                self.report(&AppError::UserNotFound(raw.trim().to_string()))?;
                Ok(Field::Rejected)
            }
        }
    }

    fn read_amount(&mut self) -> Result<Field<Amount>> {
        let Some(raw) = self.prompt("Amount: ")? else {
            return Ok(Field::Eof);
        };
        match parse_amount(&raw) {
            Ok(amount) => Ok(Field::Value(amount)),
            Err(e) => {
                writeln!(self.output, "Error: {}", e)?;
                Ok(Field::Rejected)
            }
        }
    }

    fn read_parsed<T>(&mut self, label: &str) -> Result<Field<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(raw) = self.prompt(label)? else {
            return Ok(Field::Eof);
        };
        match raw.parse::<T>() {
            Ok(value) => Ok(Field::Value(value)),
            Err(e) => {
                writeln!(self.output, "Error: {}", e)?;
                Ok(Field::Rejected)
            }
        }
    }

    /// Print a label and read one line. Returns `None` at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn report(&mut self, error: &AppError) -> Result<()> {
        if error.is_user_error() {
            warn!(%error, "Operation rejected");
        } else {
            warn!(%error, "Operation failed");
        }
        writeln!(self.output, "Error: {}", error)?;
        Ok(())
    }
}

pub(crate) fn write_movement<W: Write>(
    out: &mut W,
    verb: &str,
    currency: Currency,
    amount: Amount,
    record: &BalanceRecord,
) -> std::io::Result<()> {
    writeln!(
        out,
        "{} {} {}. New {} balance: {}",
        verb,
        format_amount(currency, amount),
        currency,
        currency,
        format_amount(currency, record.get(currency))
    )
}

pub(crate) fn write_conversion<W: Write>(
    out: &mut W,
    conversion: &Conversion,
) -> std::io::Result<()> {
    writeln!(
        out,
        "Converted {} {} -> {} {}",
        format_scaled(conversion.amount, 4),
        conversion.from,
        format_scaled(conversion.converted, 4),
        conversion.to
    )
}

pub(crate) fn write_balance_view<W: Write>(out: &mut W, view: &BalanceView) -> std::io::Result<()> {
    writeln!(out, "User: {} (UID: {})", view.user.name, view.user.uid)?;
    for (currency, amount) in view.balance.entries() {
        writeln!(out, "  {}: {}", currency, format_amount(currency, amount))?;
    }
    writeln!(
        out,
        "  Approx Total USD Value: {}",
        format_scaled(view.total_usd, 2)
    )
}

pub(crate) fn write_users<W: Write>(out: &mut W, users: &[User]) -> std::io::Result<()> {
    if users.is_empty() {
        return writeln!(out, "No users found.");
    }
    writeln!(out, "{:<38} {:<20} {}", "UID", "NAME", "EMAIL")?;
    writeln!(out, "{}", "-".repeat(80))?;
    for user in users {
        writeln!(out, "{:<38} {:<20} {}", user.uid, user.name, user.email)?;
    }
    Ok(())
}
