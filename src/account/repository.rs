//! User-scoped access to accounts.

use rusqlite::Connection;
use serde_json::Value;

use crate::{
    Error, UserID,
    account::{Account, AccountType, find_account, get_accounts_by_type, get_meta_value},
    database_id::AccountId,
};

/// Account lookups on behalf of one user.
pub trait AccountRepository {
    /// Get the account with `id`, or `None` if the user has no such account.
    fn find(&self, id: AccountId) -> Result<Option<Account>, Error>;

    /// Get the user's accounts whose type is one of `account_types`.
    fn get_accounts_by_type(&self, account_types: &[AccountType]) -> Result<Vec<Account>, Error>;

    /// Get the meta value `name` of `account`, or `None` if it was never set.
    fn get_meta_value(&self, account: &Account, name: &str) -> Result<Option<Value>, Error>;
}

/// [AccountRepository] backed by the application database.
#[derive(Debug, Clone, Copy)]
pub struct SqliteAccounts<'a> {
    connection: &'a Connection,
    user_id: UserID,
}

impl<'a> SqliteAccounts<'a> {
    /// Look up the accounts of `user_id`.
    pub fn new(connection: &'a Connection, user_id: UserID) -> Self {
        Self {
            connection,
            user_id,
        }
    }
}

impl AccountRepository for SqliteAccounts<'_> {
    fn find(&self, id: AccountId) -> Result<Option<Account>, Error> {
        find_account(self.user_id, id, self.connection)
    }

    fn get_accounts_by_type(&self, account_types: &[AccountType]) -> Result<Vec<Account>, Error> {
        get_accounts_by_type(self.user_id, account_types, self.connection)
    }

    fn get_meta_value(&self, account: &Account, name: &str) -> Result<Option<Value>, Error> {
        if account.user_id != self.user_id {
            return Ok(None);
        }

        get_meta_value(account.id, name, self.connection)
    }
}
