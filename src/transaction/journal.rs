//! Writes journals together with their legs.

use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    Error, UserID,
    account::{Account, AccountType, find_account},
    budget::BudgetFactory,
    category::find_or_create_category,
    currency::{default_currency_for_user, find_currency},
    database_id::{AccountId, BudgetId, CategoryId, CurrencyId, JournalId},
    transaction::{Journal, TransactionType, find_journal},
};

/// The validated data for creating or replacing a journal.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalData {
    /// The kind of event.
    pub transaction_type: TransactionType,
    /// Text describing the event.
    pub description: String,
    /// When the event happened.
    pub date: Date,
    /// The strictly positive amount that moves from source to destination.
    pub amount: f64,
    /// Where the money comes from.
    pub source_id: AccountId,
    /// Where the money goes.
    pub destination_id: AccountId,
    /// The currency of `amount`, the user's default currency when `None`.
    pub currency_id: Option<CurrencyId>,
    /// The budget to assign, looked up by ID.
    pub budget_id: Option<BudgetId>,
    /// The budget to assign, looked up by name when `budget_id` does not match.
    pub budget_name: Option<String>,
    /// The category to file under, looked up by ID.
    pub category_id: Option<CategoryId>,
    /// The category to file under, created if the user has none by this name.
    pub category_name: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

struct ResolvedJournal {
    currency_id: CurrencyId,
    budget_id: Option<BudgetId>,
    category_id: Option<CategoryId>,
}

/// Store a new journal with a source leg of `-amount` and a destination leg of `+amount`.
///
/// # Errors
/// Returns:
/// - [Error::InvalidAccount] if an account is not the user's or does not fit the transaction type,
/// - [Error::InvalidReference] if the currency does not exist,
/// - or [Error::SqlError] if some other SQL error occurred.
pub fn store_journal(
    user_id: UserID,
    data: &JournalData,
    connection: &Connection,
) -> Result<Journal, Error> {
    let now = OffsetDateTime::now_utc();
    let transaction = connection.unchecked_transaction()?;
    let resolved = resolve(user_id, data, &transaction)?;

    transaction.execute(
        "INSERT INTO transaction_journal (user_id, transaction_type, description, date, currency_id,
            budget_id, category_id, notes, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        (
            user_id.as_i64(),
            data.transaction_type.as_str(),
            &data.description,
            data.date,
            resolved.currency_id,
            resolved.budget_id,
            resolved.category_id,
            &data.notes,
            now,
        ),
    )?;
    let journal_id = transaction.last_insert_rowid();

    insert_legs(journal_id, data, resolved.currency_id, now, &transaction)?;
    transaction.commit()?;

    tracing::debug!("Stored journal {journal_id} for user {user_id}.");

    Ok(Journal {
        id: journal_id,
        user_id,
        transaction_type: data.transaction_type,
        description: data.description.clone(),
        date: data.date,
        currency_id: resolved.currency_id,
        budget_id: resolved.budget_id,
        category_id: resolved.category_id,
        notes: data.notes.clone(),
        created_at: now,
        updated_at: now,
    })
}

/// Replace the fields and both legs of an existing journal.
///
/// # Errors
/// Returns [Error::UpdateMissingJournal] if the journal is not one of the
/// user's, otherwise the same errors as [store_journal].
pub fn update_journal(
    user_id: UserID,
    journal: &Journal,
    data: &JournalData,
    connection: &Connection,
) -> Result<Journal, Error> {
    if journal.user_id != user_id || find_journal(user_id, journal.id, connection)?.is_none() {
        return Err(Error::UpdateMissingJournal);
    }

    let now = OffsetDateTime::now_utc();
    let transaction = connection.unchecked_transaction()?;
    let resolved = resolve(user_id, data, &transaction)?;

    transaction.execute(
        "UPDATE transaction_journal SET transaction_type = ?1, description = ?2, date = ?3,
            currency_id = ?4, budget_id = ?5, category_id = ?6, notes = ?7, updated_at = ?8
        WHERE id = ?9 AND user_id = ?10",
        (
            data.transaction_type.as_str(),
            &data.description,
            data.date,
            resolved.currency_id,
            resolved.budget_id,
            resolved.category_id,
            &data.notes,
            now,
            journal.id,
            user_id.as_i64(),
        ),
    )?;
    update_legs(journal.id, data, resolved.currency_id, now, &transaction)?;
    transaction.commit()?;

    tracing::debug!("Updated journal {} for user {user_id}.", journal.id);

    Ok(Journal {
        id: journal.id,
        user_id,
        transaction_type: data.transaction_type,
        description: data.description.clone(),
        date: data.date,
        currency_id: resolved.currency_id,
        budget_id: resolved.budget_id,
        category_id: resolved.category_id,
        notes: data.notes.clone(),
        created_at: journal.created_at,
        updated_at: now,
    })
}

/// Delete a journal. Its legs, attachments and piggy bank events go with it.
///
/// # Errors
/// Returns [Error::DeleteMissingJournal] if the journal is not one of the user's.
pub fn destroy_journal(
    user_id: UserID,
    journal: &Journal,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM transaction_journal WHERE id = ?1 AND user_id = ?2",
        (journal.id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingJournal);
    }

    tracing::debug!("Deleted journal {} for user {user_id}.", journal.id);

    Ok(())
}

fn resolve(
    user_id: UserID,
    data: &JournalData,
    connection: &Connection,
) -> Result<ResolvedJournal, Error> {
    let source = find_account(user_id, data.source_id, connection)?.ok_or_else(|| {
        Error::InvalidAccount(format!("source account {} does not exist", data.source_id))
    })?;
    let destination = find_account(user_id, data.destination_id, connection)?.ok_or_else(|| {
        Error::InvalidAccount(format!(
            "destination account {} does not exist",
            data.destination_id
        ))
    })?;

    check_account_types(data.transaction_type, &source, &destination)?;

    let currency_id = match data.currency_id {
        Some(currency_id) => find_currency(currency_id, connection)?
            .ok_or(Error::InvalidReference)?
            .id,
        None => default_currency_for_user(user_id, connection)?.id,
    };

    // Only withdrawals count against a budget.
    let budget_id = if data.transaction_type == TransactionType::Withdrawal {
        BudgetFactory::new(connection, user_id)
            .find(data.budget_id, data.budget_name.as_deref())?
            .map(|budget| budget.id)
    } else {
        None
    };

    let category_id = find_or_create_category(
        user_id,
        data.category_id,
        data.category_name.as_deref(),
        connection,
    )?
    .map(|category| category.id);

    Ok(ResolvedJournal {
        currency_id,
        budget_id,
        category_id,
    })
}

fn check_account_types(
    transaction_type: TransactionType,
    source: &Account,
    destination: &Account,
) -> Result<(), Error> {
    use AccountType::*;

    if source.id == destination.id {
        return Err(Error::InvalidAccount(
            "source and destination must be different accounts".to_owned(),
        ));
    }

    let allowed: &[(AccountType, AccountType)] = match transaction_type {
        TransactionType::Withdrawal => &[(Asset, Expense)],
        TransactionType::Deposit => &[(Revenue, Asset)],
        TransactionType::Transfer => &[(Asset, Asset)],
        TransactionType::OpeningBalance => &[(InitialBalance, Asset), (Asset, InitialBalance)],
        TransactionType::Reconciliation => &[(Reconciliation, Asset), (Asset, Reconciliation)],
    };

    if allowed.contains(&(source.account_type, destination.account_type)) {
        Ok(())
    } else {
        Err(Error::InvalidAccount(format!(
            "a {transaction_type} cannot move money from a {} account to a {} account",
            source.account_type, destination.account_type
        )))
    }
}

fn insert_legs(
    journal_id: JournalId,
    data: &JournalData,
    currency_id: CurrencyId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    let mut statement = connection.prepare(
        "INSERT INTO \"transaction\" (journal_id, account_id, amount, currency_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
    )?;

    statement.execute((journal_id, data.source_id, -data.amount, currency_id, now))?;
    statement.execute((journal_id, data.destination_id, data.amount, currency_id, now))?;

    Ok(())
}

/// Rewrite both legs of a journal in place so their IDs stay the same.
///
/// The source leg is the one with a negative amount.
fn update_legs(
    journal_id: JournalId,
    data: &JournalData,
    currency_id: CurrencyId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    let source_rows = connection.execute(
        "UPDATE \"transaction\" SET account_id = ?1, amount = ?2, currency_id = ?3, updated_at = ?4
        WHERE journal_id = ?5 AND amount < 0",
        (data.source_id, -data.amount, currency_id, now, journal_id),
    )?;
    let destination_rows = connection.execute(
        "UPDATE \"transaction\" SET account_id = ?1, amount = ?2, currency_id = ?3, updated_at = ?4
        WHERE journal_id = ?5 AND amount >= 0",
        (data.destination_id, data.amount, currency_id, now, journal_id),
    )?;

    if source_rows != 1 || destination_rows != 1 {
        tracing::error!(
            "Journal {journal_id} has {source_rows} source and {destination_rows} destination legs, expected one of each."
        );
        return Err(Error::UpdateMissingJournal);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        Error,
        account::AccountType,
        budget::create_budget,
        test_utils::{
            get_test_connection, insert_account, insert_test_user, insert_user, withdrawal_data,
        },
        transaction::{
            JournalData, TransactionType, destroy_journal, find_journal, get_journal_transactions,
            store_journal, update_journal,
        },
    };

    #[test]
    fn store_writes_balancing_legs() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let data = withdrawal_data(&conn, user.id, 20.0);

        let journal = store_journal(user.id, &data, &conn).unwrap();

        let legs = get_journal_transactions(journal.id, &conn).unwrap();
        assert_eq!(legs[0].account_id, data.source_id);
        assert_eq!(legs[0].amount, -20.0);
        assert_eq!(legs[1].account_id, data.destination_id);
        assert_eq!(legs[1].amount, 20.0);
        assert_eq!(find_journal(user.id, journal.id, &conn).unwrap(), Some(journal));
    }

    #[test]
    fn store_uses_default_currency() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let data = withdrawal_data(&conn, user.id, 20.0);

        let journal = store_journal(user.id, &data, &conn).unwrap();

        let euro = crate::currency::find_currency_by_code("EUR", &conn)
            .unwrap()
            .unwrap();
        assert_eq!(journal.currency_id, euro.id);
    }

    #[test]
    fn store_rejects_wrong_account_types() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let data = JournalData {
            transaction_type: TransactionType::Deposit,
            ..withdrawal_data(&conn, user.id, 20.0)
        };

        let result = store_journal(user.id, &data, &conn);

        assert!(matches!(result, Err(Error::InvalidAccount(_))));
    }

    #[test]
    fn store_rejects_accounts_of_other_users() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let other = insert_user(&conn, "other@example.com", "other-token");
        let data = JournalData {
            destination_id: insert_account(&conn, other.id, "Their shop", AccountType::Expense).id,
            ..withdrawal_data(&conn, user.id, 20.0)
        };

        let result = store_journal(user.id, &data, &conn);

        assert!(matches!(result, Err(Error::InvalidAccount(_))));
    }

    #[test]
    fn store_rejects_unknown_currency() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let data = JournalData {
            currency_id: Some(9999),
            ..withdrawal_data(&conn, user.id, 20.0)
        };

        assert_eq!(store_journal(user.id, &data, &conn), Err(Error::InvalidReference));
    }

    #[test]
    fn budget_only_applies_to_withdrawals() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let budget = create_budget(user.id, "Groceries", &conn).unwrap();
        let withdrawal = JournalData {
            budget_name: Some("Groceries".to_owned()),
            ..withdrawal_data(&conn, user.id, 20.0)
        };
        let savings = insert_account(&conn, user.id, "Savings", AccountType::Asset);
        let transfer = JournalData {
            transaction_type: TransactionType::Transfer,
            destination_id: savings.id,
            ..withdrawal.clone()
        };

        let withdrawal = store_journal(user.id, &withdrawal, &conn).unwrap();
        let transfer = store_journal(user.id, &transfer, &conn).unwrap();

        assert_eq!(withdrawal.budget_id, Some(budget.id));
        assert_eq!(transfer.budget_id, None);
    }

    #[test]
    fn update_replaces_fields_and_legs() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let data = withdrawal_data(&conn, user.id, 20.0);
        let journal = store_journal(user.id, &data, &conn).unwrap();
        let new_data = JournalData {
            description: "Updated".to_owned(),
            date: date!(2024 - 02 - 01),
            amount: 35.0,
            ..data
        };

        let leg_ids: Vec<i64> = get_journal_transactions(journal.id, &conn)
            .unwrap()
            .iter()
            .map(|leg| leg.id)
            .collect();

        let updated = update_journal(user.id, &journal, &new_data, &conn).unwrap();

        assert_eq!(updated.id, journal.id);
        assert_eq!(updated.description, "Updated");
        assert_eq!(updated.created_at, journal.created_at);
        let legs = get_journal_transactions(journal.id, &conn).unwrap();
        let amounts: Vec<f64> = legs.iter().map(|leg| leg.amount).collect();
        assert_eq!(amounts, vec![-35.0, 35.0]);
        let updated_leg_ids: Vec<i64> = legs.iter().map(|leg| leg.id).collect();
        assert_eq!(updated_leg_ids, leg_ids);
    }

    #[test]
    fn update_of_other_users_journal_fails() {
        let conn = get_test_connection();
        let owner = insert_test_user(&conn);
        let other = insert_user(&conn, "other@example.com", "other-token");
        let data = withdrawal_data(&conn, owner.id, 20.0);
        let journal = store_journal(owner.id, &data, &conn).unwrap();

        let result = update_journal(other.id, &journal, &data, &conn);

        assert_eq!(result, Err(Error::UpdateMissingJournal));
    }

    #[test]
    fn destroy_removes_journal_and_legs() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let journal = store_journal(user.id, &withdrawal_data(&conn, user.id, 20.0), &conn).unwrap();

        destroy_journal(user.id, &journal, &conn).unwrap();

        assert_eq!(find_journal(user.id, journal.id, &conn).unwrap(), None);
        assert_eq!(get_journal_transactions(journal.id, &conn).unwrap(), vec![]);
        assert_eq!(
            destroy_journal(user.id, &journal, &conn),
            Err(Error::DeleteMissingJournal)
        );
    }
}
