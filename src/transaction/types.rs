//! Maps the `type` request parameter to the transaction types it stands for.

use crate::transaction::TransactionType;

/// The transaction types selected by the `type` parameter of a transaction list request.
///
/// A missing, `default` or unrecognised value selects every type except transfers.
pub fn map_transaction_types(requested: Option<&str>) -> Vec<TransactionType> {
    use TransactionType::*;

    match requested.map(str::trim).unwrap_or("default") {
        "all" => TransactionType::ALL.to_vec(),
        "withdrawal" | "withdrawals" | "expense" | "expenses" => vec![Withdrawal],
        "deposit" | "deposits" | "income" => vec![Deposit],
        "transfer" | "transfers" => vec![Transfer],
        "opening_balance" => vec![OpeningBalance],
        "reconciliation" | "reconciliations" => vec![Reconciliation],
        "special" | "specials" => vec![OpeningBalance, Reconciliation],
        _ => vec![Withdrawal, Deposit, OpeningBalance, Reconciliation],
    }
}
