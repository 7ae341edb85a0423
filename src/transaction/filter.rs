//! Named predicates that narrow down the legs a [TransactionQuery](super::TransactionQuery) returns.

/// A predicate over transaction legs.
///
/// Filters are identified by their variant, so a query holds each filter at
/// most once and the order they were added in does not matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransactionFilter {
    /// Keep legs with an amount of zero or more.
    PositiveAmount,
    /// Keep legs with an amount below zero.
    NegativeAmount,
    /// Drop legs of transfers between two asset accounts when the query is
    /// scoped to all asset accounts.
    InternalTransfer,
}

impl TransactionFilter {
    /// The SQL condition for the filter, or `None` when it does not apply.
    ///
    /// Expects the leg as `t`, its account as `a` and its journal as `j`.
    pub(crate) fn sql_condition(&self, all_asset_accounts: bool) -> Option<&'static str> {
        match self {
            TransactionFilter::PositiveAmount => Some("t.amount >= 0"),
            TransactionFilter::NegativeAmount => Some("t.amount < 0"),
            TransactionFilter::InternalTransfer if all_asset_accounts => Some(
                "NOT (j.transaction_type = 'transfer' AND a.account_type = 'asset' AND EXISTS (
                    SELECT 1 FROM \"transaction\" other_leg
                    INNER JOIN account other_account ON other_account.id = other_leg.account_id
                    WHERE other_leg.journal_id = t.journal_id
                        AND other_leg.id != t.id
                        AND other_account.account_type = 'asset'
                ))",
            ),
            TransactionFilter::InternalTransfer => None,
        }
    }
}
