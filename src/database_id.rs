//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The ID of a single transaction leg.
pub type TransactionId = DatabaseId;
/// The ID of a transaction journal.
pub type JournalId = DatabaseId;
/// The ID of an account.
pub type AccountId = DatabaseId;
/// The ID of a budget.
pub type BudgetId = DatabaseId;
/// The ID of a category.
pub type CategoryId = DatabaseId;
/// The ID of a transaction currency.
pub type CurrencyId = DatabaseId;
