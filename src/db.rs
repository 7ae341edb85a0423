//! Creates the application's database schema.

use std::str::FromStr;

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior, types::Type};

use crate::{
    Error,
    account::{create_account_meta_table, create_account_table},
    attachment::create_attachment_table,
    budget::create_budget_table,
    category::create_category_table,
    currency::{create_currency_table, seed_currencies},
    import_job::create_import_job_table,
    piggy_bank::{create_piggy_bank_event_table, create_piggy_bank_table},
    preferences::create_preference_table,
    transaction::{create_journal_table, create_transaction_table},
    user::create_user_table,
};

/// Create all of the database tables for the application.
///
/// Tables that already exist are left untouched, so this is safe to call on
/// every start up.
///
/// # Errors
/// This function may return a [Error::SqlError] if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_preference_table(&transaction)?;
    create_currency_table(&transaction)?;
    create_account_table(&transaction)?;
    create_account_meta_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_category_table(&transaction)?;
    create_journal_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_attachment_table(&transaction)?;
    create_piggy_bank_table(&transaction)?;
    create_piggy_bank_event_table(&transaction)?;
    create_import_job_table(&transaction)?;

    seed_currencies(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Read the text column at `index` and parse it into `T`, e.g. an enum stored by name.
///
/// # Errors
/// Returns [rusqlite::Error::FromSqlConversionFailure] if the text does not parse.
pub fn parse_column<T>(row: &Row, index: usize) -> Result<T, rusqlite::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(index)?;

    raw.parse()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}
