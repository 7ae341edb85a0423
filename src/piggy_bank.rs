//! Piggy banks and the events that move money in and out of them.

use rusqlite::{Connection, OptionalExtension, Row};
use time::{Date, OffsetDateTime};

use crate::{
    Error, UserID,
    database_id::{AccountId, DatabaseId, JournalId},
};

/// A savings goal tied to an asset account.
#[derive(Debug, Clone, PartialEq)]
pub struct PiggyBank {
    /// The ID of the piggy bank.
    pub id: DatabaseId,
    /// The user that owns the piggy bank.
    pub user_id: UserID,
    /// The asset account the money is kept in.
    pub account_id: AccountId,
    /// The display name.
    pub name: String,
    /// The amount to save.
    pub target_amount: f64,
    /// When the piggy bank was created.
    pub created_at: OffsetDateTime,
    /// When the piggy bank was last changed.
    pub updated_at: OffsetDateTime,
}

/// Money added to or removed from a piggy bank, optionally by a journal.
#[derive(Debug, Clone, PartialEq)]
pub struct PiggyBankEvent {
    /// The ID of the event.
    pub id: DatabaseId,
    /// The piggy bank the money moved in or out of.
    pub piggy_bank_id: DatabaseId,
    /// The name of the piggy bank.
    pub piggy_bank_name: String,
    /// The journal that caused the event.
    pub journal_id: Option<JournalId>,
    /// Negative when money was taken out.
    pub amount: f64,
    /// When the money moved.
    pub date: Date,
    /// When the event was created.
    pub created_at: OffsetDateTime,
    /// When the event was last changed.
    pub updated_at: OffsetDateTime,
}

/// Create the piggy bank table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_piggy_bank_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS piggy_bank (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            target_amount REAL NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Create the piggy bank event table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_piggy_bank_event_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS piggy_bank_event (
            id INTEGER PRIMARY KEY,
            piggy_bank_id INTEGER NOT NULL,
            journal_id INTEGER,
            amount REAL NOT NULL,
            date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(piggy_bank_id) REFERENCES piggy_bank(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(journal_id) REFERENCES transaction_journal(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Create a piggy bank for `user_id` on `account_id`.
///
/// # Errors
/// Returns [Error::InvalidReference] if the account does not exist, or an
/// error if there is an SQL error.
pub fn create_piggy_bank(
    user_id: UserID,
    account_id: AccountId,
    name: &str,
    target_amount: f64,
    connection: &Connection,
) -> Result<PiggyBank, Error> {
    let now = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO piggy_bank (user_id, account_id, name, target_amount, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        (user_id.as_i64(), account_id, name, target_amount, now),
    )?;

    Ok(PiggyBank {
        id: connection.last_insert_rowid(),
        user_id,
        account_id,
        name: name.to_owned(),
        target_amount,
        created_at: now,
        updated_at: now,
    })
}

/// Get the user's piggy bank with `id`.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn find_piggy_bank(
    user_id: UserID,
    id: DatabaseId,
    connection: &Connection,
) -> Result<Option<PiggyBank>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, account_id, name, target_amount, created_at, updated_at
            FROM piggy_bank WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), |row| {
            Ok(PiggyBank {
                id: row.get(0)?,
                user_id: UserID::new(row.get(1)?),
                account_id: row.get(2)?,
                name: row.get(3)?,
                target_amount: row.get(4)?,
                created_at: row.get(5)?,
                updated_at: row.get(6)?,
            })
        })
        .optional()
        .map_err(|error| error.into())
}

/// Record money moving in or out of a piggy bank.
///
/// # Errors
/// Returns [Error::InvalidReference] if the piggy bank or journal does not
/// exist, or an error if there is an SQL error.
pub fn create_piggy_bank_event(
    piggy_bank: &PiggyBank,
    journal_id: Option<JournalId>,
    amount: f64,
    date: Date,
    connection: &Connection,
) -> Result<PiggyBankEvent, Error> {
    let now = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO piggy_bank_event (piggy_bank_id, journal_id, amount, date, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        (piggy_bank.id, journal_id, amount, date, now),
    )?;

    Ok(PiggyBankEvent {
        id: connection.last_insert_rowid(),
        piggy_bank_id: piggy_bank.id,
        piggy_bank_name: piggy_bank.name.clone(),
        journal_id,
        amount,
        date,
        created_at: now,
        updated_at: now,
    })
}

/// Get the events caused by one of the user's journals, oldest first.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn get_journal_piggy_bank_events(
    user_id: UserID,
    journal_id: JournalId,
    connection: &Connection,
) -> Result<Vec<PiggyBankEvent>, Error> {
    connection
        .prepare(
            "SELECT e.id, e.piggy_bank_id, p.name, e.journal_id, e.amount, e.date, e.created_at, e.updated_at
            FROM piggy_bank_event e
            INNER JOIN piggy_bank p ON p.id = e.piggy_bank_id
            WHERE p.user_id = ?1 AND e.journal_id = ?2
            ORDER BY e.date ASC, e.id ASC",
        )?
        .query_map((user_id.as_i64(), journal_id), map_event_row)?
        .map(|maybe_event| maybe_event.map_err(|error| error.into()))
        .collect()
}

fn map_event_row(row: &Row) -> Result<PiggyBankEvent, rusqlite::Error> {
    Ok(PiggyBankEvent {
        id: row.get(0)?,
        piggy_bank_id: row.get(1)?,
        piggy_bank_name: row.get(2)?,
        journal_id: row.get(3)?,
        amount: row.get(4)?,
        date: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
