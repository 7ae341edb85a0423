use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, OptionalExtension, Row};
use time::{Date, OffsetDateTime};

use crate::{
    Error, UserID,
    database_id::{AccountId, BudgetId, CategoryId, CurrencyId, JournalId, TransactionId},
    db::parse_column,
};

/// The kind of financial event a journal records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransactionType {
    /// Money leaves an asset account to an expense account.
    Withdrawal,
    /// Money enters an asset account from a revenue account.
    Deposit,
    /// Money moves between two asset accounts.
    Transfer,
    /// The starting balance of an asset account.
    OpeningBalance,
    /// A correction that makes an asset account match the bank.
    Reconciliation,
}

impl TransactionType {
    /// Every transaction type.
    pub const ALL: [TransactionType; 5] = [
        TransactionType::Withdrawal,
        TransactionType::Deposit,
        TransactionType::Transfer,
        TransactionType::OpeningBalance,
        TransactionType::Reconciliation,
    ];

    /// The name the type is stored and rendered as.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Deposit => "deposit",
            TransactionType::Transfer => "transfer",
            TransactionType::OpeningBalance => "opening_balance",
            TransactionType::Reconciliation => "reconciliation",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .into_iter()
            .find(|transaction_type| transaction_type.as_str() == s)
            .ok_or_else(|| Error::InvalidRequest(format!("unknown transaction type \"{s}\"")))
    }
}

/// One financial event, made up of two or more transaction legs.
#[derive(Debug, Clone, PartialEq)]
pub struct Journal {
    /// The ID of the journal.
    pub id: JournalId,
    /// The user that owns the journal.
    pub user_id: UserID,
    /// The kind of event.
    pub transaction_type: TransactionType,
    /// Text describing the event.
    pub description: String,
    /// When the event happened.
    pub date: Date,
    /// The currency of the amounts on the legs.
    pub currency_id: CurrencyId,
    /// The budget the journal counts against.
    pub budget_id: Option<BudgetId>,
    /// The category the journal is filed under.
    pub category_id: Option<CategoryId>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When the journal was created.
    pub created_at: OffsetDateTime,
    /// When the journal was last changed.
    pub updated_at: OffsetDateTime,
}

/// One leg of a journal: an amount booked on one account.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the leg.
    pub id: TransactionId,
    /// The journal the leg belongs to.
    pub journal_id: JournalId,
    /// The account the amount is booked on.
    pub account_id: AccountId,
    /// Negative when money leaves the account.
    pub amount: f64,
    /// The currency of `amount`.
    pub currency_id: CurrencyId,
    /// When the leg was created.
    pub created_at: OffsetDateTime,
    /// When the leg was last changed.
    pub updated_at: OffsetDateTime,
}

/// Create the journal table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_journal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS transaction_journal (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            transaction_type TEXT NOT NULL,
            description TEXT NOT NULL,
            date TEXT NOT NULL,
            currency_id INTEGER NOT NULL,
            budget_id INTEGER,
            category_id INTEGER,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(currency_id) REFERENCES transaction_currency(id) ON UPDATE CASCADE,
            FOREIGN KEY(budget_id) REFERENCES budget(id) ON UPDATE CASCADE ON DELETE SET NULL,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_journal_user_date ON transaction_journal(user_id, date);",
    )?;

    Ok(())
}

/// Create the transaction (leg) table in the database.
///
/// Legs are deleted together with their journal.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            journal_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            currency_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(journal_id) REFERENCES transaction_journal(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE,
            FOREIGN KEY(currency_id) REFERENCES transaction_currency(id) ON UPDATE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_journal ON \"transaction\"(journal_id);",
    )?;

    Ok(())
}

/// Get the user's transaction leg with `id`, or `None` if the user has no such leg.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn find_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Option<Transaction>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.journal_id, t.account_id, t.amount, t.currency_id, t.created_at, t.updated_at
            FROM \"transaction\" t
            INNER JOIN transaction_journal j ON j.id = t.journal_id
            WHERE t.id = ?1 AND j.user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_transaction_row)
        .optional()
        .map_err(|error| error.into())
}

/// Get the user's journal with `id`, or `None` if the user has no such journal.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn find_journal(
    user_id: UserID,
    id: JournalId,
    connection: &Connection,
) -> Result<Option<Journal>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, transaction_type, description, date, currency_id, budget_id,
                category_id, notes, created_at, updated_at
            FROM transaction_journal WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_journal_row)
        .optional()
        .map_err(|error| error.into())
}

/// Get the journal that owns the user's transaction leg `transaction_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the user has no such leg, or an error if there is an SQL error.
pub fn find_journal_by_transaction(
    user_id: UserID,
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Journal, Error> {
    let transaction = find_transaction(user_id, transaction_id, connection)?.ok_or(Error::NotFound)?;

    find_journal(user_id, transaction.journal_id, connection)?.ok_or(Error::NotFound)
}

/// Get the legs of a journal ordered by ID.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn get_journal_transactions(
    journal_id: JournalId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, journal_id, account_id, amount, currency_id, created_at, updated_at
            FROM \"transaction\" WHERE journal_id = ?1 ORDER BY id ASC",
        )?
        .query_map([journal_id], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

fn map_journal_row(row: &Row) -> Result<Journal, rusqlite::Error> {
    Ok(Journal {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        transaction_type: parse_column(row, 2)?,
        description: row.get(3)?,
        date: row.get(4)?,
        currency_id: row.get(5)?,
        budget_id: row.get(6)?,
        category_id: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        journal_id: row.get(1)?,
        account_id: row.get(2)?,
        amount: row.get(3)?,
        currency_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
