//! Transaction currencies and the lookup of a user's default currency.
//!
//! Currencies are shared by all users.

use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::Value;

use crate::{
    Error, UserID,
    database_id::CurrencyId,
    preferences::{CURRENCY_PREFERENCE, get_preference},
};

/// The currency used when the user has not picked one.
pub const FALLBACK_CURRENCY_CODE: &str = "EUR";

/// A currency that amounts can be recorded in.
#[derive(Debug, Clone, PartialEq)]
pub struct Currency {
    /// The ID of the currency.
    pub id: CurrencyId,
    /// The ISO 4217 code, e.g. "EUR".
    pub code: String,
    /// The display name, e.g. "Euro".
    pub name: String,
    /// The display symbol, e.g. "€".
    pub symbol: String,
    /// The number of digits after the decimal point.
    pub decimal_places: u8,
}

const SEED_CURRENCIES: [(&str, &str, &str, u8); 6] = [
    ("EUR", "Euro", "€", 2),
    ("USD", "US Dollar", "$", 2),
    ("GBP", "British Pound", "£", 2),
    ("NZD", "New Zealand Dollar", "$", 2),
    ("AUD", "Australian Dollar", "$", 2),
    ("JPY", "Japanese Yen", "¥", 0),
];

/// Create the currency table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_currency_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transaction_currency (
            id INTEGER PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            symbol TEXT NOT NULL,
            decimal_places INTEGER NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Insert the common currencies if they are missing.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn seed_currencies(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement = connection.prepare(
        "INSERT OR IGNORE INTO transaction_currency (code, name, symbol, decimal_places)
        VALUES (?1, ?2, ?3, ?4)",
    )?;

    for currency in SEED_CURRENCIES {
        statement.execute(currency)?;
    }

    Ok(())
}

/// Get the currency with `id`, or `None` if there is no such currency.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn find_currency(id: CurrencyId, connection: &Connection) -> Result<Option<Currency>, Error> {
    connection
        .prepare(
            "SELECT id, code, name, symbol, decimal_places FROM transaction_currency WHERE id = ?1",
        )?
        .query_row([id], map_row)
        .optional()
        .map_err(|error| error.into())
}

/// Get the currency with the ISO 4217 `code`, or `None` if there is no such currency.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn find_currency_by_code(code: &str, connection: &Connection) -> Result<Option<Currency>, Error> {
    connection
        .prepare(
            "SELECT id, code, name, symbol, decimal_places FROM transaction_currency WHERE code = ?1",
        )?
        .query_row([code], map_row)
        .optional()
        .map_err(|error| error.into())
}

/// Get the currency the user prefers, falling back to [FALLBACK_CURRENCY_CODE].
///
/// A preference naming an unknown currency is treated like a missing preference.
///
/// # Errors
/// Returns [Error::MissingDefaultCurrency] if the fallback currency does not exist either.
pub fn default_currency_for_user(user_id: UserID, connection: &Connection) -> Result<Currency, Error> {
    let preferred = match get_preference(user_id, CURRENCY_PREFERENCE, connection)? {
        Some(Value::String(code)) => find_currency_by_code(&code, connection)?,
        _ => None,
    };

    if let Some(currency) = preferred {
        return Ok(currency);
    }

    find_currency_by_code(FALLBACK_CURRENCY_CODE, connection)?.ok_or(Error::MissingDefaultCurrency)
}

/// Currency lookups for one user.
pub trait CurrencyRepository {
    /// Get the currency with `id`, or `None` if there is no such currency.
    fn find(&self, id: CurrencyId) -> Result<Option<Currency>, Error>;

    /// Get the currency the user uses when none is specified.
    fn default_currency(&self) -> Result<Currency, Error>;
}

/// [CurrencyRepository] backed by the application database.
#[derive(Debug, Clone, Copy)]
pub struct SqliteCurrencies<'a> {
    connection: &'a Connection,
    user_id: UserID,
}

impl<'a> SqliteCurrencies<'a> {
    /// Look up currencies on behalf of `user_id`.
    pub fn new(connection: &'a Connection, user_id: UserID) -> Self {
        Self {
            connection,
            user_id,
        }
    }
}

impl CurrencyRepository for SqliteCurrencies<'_> {
    fn find(&self, id: CurrencyId) -> Result<Option<Currency>, Error> {
        find_currency(id, self.connection)
    }

    fn default_currency(&self) -> Result<Currency, Error> {
        default_currency_for_user(self.user_id, self.connection)
    }
}

fn map_row(row: &Row) -> Result<Currency, rusqlite::Error> {
    Ok(Currency {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        symbol: row.get(3)?,
        decimal_places: row.get(4)?,
    })
}
