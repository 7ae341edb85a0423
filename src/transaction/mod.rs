//! Transactions and the journals that group them.
//!
//! This module contains everything related to transactions:
//! - The `Journal` and `Transaction` models and their tables
//! - `store_journal`, `update_journal` and `destroy_journal` for writing a journal with its legs
//! - `TransactionQuery` for collecting legs with filters, eager loads and pagination
//! - The JSON:API endpoints under `/transactions`

mod collector;
mod core;
mod delete_endpoint;
mod filter;
mod index_endpoint;
mod journal;
mod render;
mod request;
mod show_endpoint;
mod store_endpoint;
mod types;
mod update_endpoint;

pub use collector::{AccountSummary, CollectedTransaction, TransactionQuery};
pub use core::{
    Journal, Transaction, TransactionType, create_journal_table, create_transaction_table,
    find_journal, find_journal_by_transaction, find_transaction, get_journal_transactions,
};
pub use delete_endpoint::delete_transaction_endpoint;
pub use filter::TransactionFilter;
pub use index_endpoint::get_transactions_endpoint;
pub use journal::{JournalData, destroy_journal, store_journal, update_journal};
pub use render::TransactionState;
pub use request::{AmountInput, TransactionRequest, parse_date};
pub use show_endpoint::{
    get_transaction_attachments_endpoint, get_transaction_endpoint,
    get_transaction_piggy_bank_events_endpoint,
};
pub use store_endpoint::store_transaction_endpoint;
pub use types::map_transaction_types;
pub use update_endpoint::update_transaction_endpoint;

pub(crate) use render::render_transactions;
