//! Accounts that money moves between, and their free-form meta data.

mod core;
mod repository;

pub use core::{
    Account, AccountType, NewAccount, create_account, create_account_meta_table,
    create_account_table, find_account, get_accounts_by_type, get_meta_value, set_meta_value,
};
pub use repository::{AccountRepository, SqliteAccounts};
