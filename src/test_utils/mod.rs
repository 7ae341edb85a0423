#![allow(missing_docs)]

pub(crate) mod http;

use axum_test::TestServer;
use email_address::EmailAddress;
use rusqlite::Connection;
use time::macros::date;

pub(crate) use http::{assert_json_api, response_data};

use crate::{
    AppState, PaginationConfig, UserID,
    account::{Account, AccountType, NewAccount, create_account},
    auth::hash_token,
    build_router,
    db::initialize,
    transaction::{Journal, JournalData, TransactionType, store_journal},
    user::{User, create_user},
};

/// The bearer token of the user created by [insert_test_user].
pub(crate) const TEST_TOKEN: &str = "let-me-in";
/// The public URL used by test servers.
pub(crate) const TEST_BASE_URL: &str = "http://localhost:3000";

#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().unwrap();
    initialize(&connection).unwrap();
    connection
}

#[track_caller]
pub(crate) fn insert_user(connection: &Connection, email: &str, token: &str) -> User {
    create_user(
        &EmailAddress::new_unchecked(email),
        &hash_token(token),
        connection,
    )
    .unwrap()
}

#[track_caller]
pub(crate) fn insert_test_user(connection: &Connection) -> User {
    insert_user(connection, "test@example.com", TEST_TOKEN)
}

#[track_caller]
pub(crate) fn insert_account(
    connection: &Connection,
    user_id: UserID,
    name: &str,
    account_type: AccountType,
) -> Account {
    create_account(
        user_id,
        NewAccount {
            name: name.to_owned(),
            account_type,
            iban: None,
        },
        connection,
    )
    .unwrap()
}

/// A withdrawal of `amount` from a new "Checking" account to a new "Shop" account.
#[track_caller]
pub(crate) fn withdrawal_data(connection: &Connection, user_id: UserID, amount: f64) -> JournalData {
    let checking = insert_account(connection, user_id, "Checking", AccountType::Asset);
    let shop = insert_account(connection, user_id, "Shop", AccountType::Expense);

    JournalData {
        transaction_type: TransactionType::Withdrawal,
        description: "Groceries".to_owned(),
        date: date!(2024 - 03 - 01),
        amount,
        source_id: checking.id,
        destination_id: shop.id,
        currency_id: None,
        budget_id: None,
        budget_name: None,
        category_id: None,
        category_name: None,
        notes: None,
    }
}

#[track_caller]
pub(crate) fn seed_withdrawal(connection: &Connection, user_id: UserID, amount: f64) -> Journal {
    let data = withdrawal_data(connection, user_id, amount);
    store_journal(user_id, &data, connection).unwrap()
}

/// Build the full router around `connection`.
///
/// Returns the server together with the app state so that tests can seed the
/// database through [AppState::db_connection].
#[track_caller]
pub(crate) fn get_test_server(connection: Connection) -> (TestServer, AppState) {
    let state = AppState::new(connection, TEST_BASE_URL, PaginationConfig::default()).unwrap();
    let server = TestServer::try_new(build_router(state.clone())).unwrap();

    (server, state)
}
