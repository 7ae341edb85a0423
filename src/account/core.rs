use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{Error, UserID, database_id::AccountId, db::parse_column};

/// What an account represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccountType {
    /// An account the user owns, e.g. a checking or savings account.
    Asset,
    /// Where money is spent, e.g. a shop.
    Expense,
    /// Where money comes from, e.g. an employer.
    Revenue,
    /// The counterpart of an opening balance.
    InitialBalance,
    /// The counterpart of a reconciliation.
    Reconciliation,
}

impl AccountType {
    /// The name the account type is stored and rendered as.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Expense => "expense",
            AccountType::Revenue => "revenue",
            AccountType::InitialBalance => "initial_balance",
            AccountType::Reconciliation => "reconciliation",
        }
    }
}

impl Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asset" => Ok(AccountType::Asset),
            "expense" => Ok(AccountType::Expense),
            "revenue" => Ok(AccountType::Revenue),
            "initial_balance" => Ok(AccountType::InitialBalance),
            "reconciliation" => Ok(AccountType::Reconciliation),
            other => Err(Error::InvalidRequest(format!(
                "unknown account type \"{other}\""
            ))),
        }
    }
}

/// An account owned by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The user that owns the account.
    pub user_id: UserID,
    /// The display name.
    pub name: String,
    /// What the account represents.
    pub account_type: AccountType,
    /// The international bank account number, if known.
    pub iban: Option<String>,
    /// Whether the account is in use.
    pub active: bool,
    /// When the account was created.
    pub created_at: OffsetDateTime,
    /// When the account was last changed.
    pub updated_at: OffsetDateTime,
}

/// The data needed to create an account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    /// The display name.
    pub name: String,
    /// What the account represents.
    pub account_type: AccountType,
    /// The international bank account number, if known.
    pub iban: Option<String>,
}

/// Create the account table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            account_type TEXT NOT NULL,
            iban TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_account_user_type ON account(user_id, account_type);",
    )?;

    Ok(())
}

/// Create the account meta data table in the database.
///
/// Each row holds one named JSON value for an account, e.g. its `currency_id`.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_account_meta_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account_meta (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            data TEXT NOT NULL,
            UNIQUE(account_id, name),
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Create an account for `user_id` and return it with its generated ID.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_account(
    user_id: UserID,
    account: NewAccount,
    connection: &Connection,
) -> Result<Account, Error> {
    let now = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO account (user_id, name, account_type, iban, active, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
        (
            user_id.as_i64(),
            &account.name,
            account.account_type.as_str(),
            &account.iban,
            now,
        ),
    )?;

    Ok(Account {
        id: connection.last_insert_rowid(),
        user_id,
        name: account.name,
        account_type: account.account_type,
        iban: account.iban,
        active: true,
        created_at: now,
        updated_at: now,
    })
}

/// Get the account with `id` if it belongs to `user_id`.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn find_account(
    user_id: UserID,
    id: AccountId,
    connection: &Connection,
) -> Result<Option<Account>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, account_type, iban, active, created_at, updated_at
            FROM account WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_row)
        .optional()
        .map_err(|error| error.into())
}

/// Get the user's accounts whose type is one of `account_types`, ordered by name.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn get_accounts_by_type(
    user_id: UserID,
    account_types: &[AccountType],
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    if account_types.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; account_types.len()].join(", ");
    let query = format!(
        "SELECT id, user_id, name, account_type, iban, active, created_at, updated_at
        FROM account WHERE user_id = ? AND account_type IN ({placeholders})
        ORDER BY name ASC, id ASC"
    );

    let mut params: Vec<rusqlite::types::Value> = vec![user_id.as_i64().into()];
    params.extend(
        account_types
            .iter()
            .map(|account_type| account_type.as_str().to_owned().into()),
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), map_row)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Get the meta value `name` of an account, or `None` if it was never set.
///
/// # Errors
/// Returns an error if the stored value is not valid JSON or if there is an SQL error.
pub fn get_meta_value(
    account_id: AccountId,
    name: &str,
    connection: &Connection,
) -> Result<Option<Value>, Error> {
    let raw: Option<String> = connection
        .prepare("SELECT data FROM account_meta WHERE account_id = ?1 AND name = ?2")?
        .query_row((account_id, name), |row| row.get(0))
        .optional()?;

    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Set the meta value `name` of an account, replacing any previous value.
///
/// # Errors
/// Returns [Error::InvalidReference] if the account does not exist, or an
/// error if there is an SQL error.
pub fn set_meta_value(
    account_id: AccountId,
    name: &str,
    value: &Value,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO account_meta (account_id, name, data) VALUES (?1, ?2, ?3)
        ON CONFLICT(account_id, name) DO UPDATE SET data = excluded.data",
        (account_id, name, serde_json::to_string(value)?),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        account_type: parse_column(row, 3)?,
        iban: row.get(4)?,
        active: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
