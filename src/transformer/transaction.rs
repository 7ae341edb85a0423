use serde_json::{Map, Value, json};

use crate::{
    transaction::{AccountSummary, CollectedTransaction},
    transformer::{Transformer, into_record, self_link, timestamp},
};

/// Renders collected transaction legs.
///
/// A negative leg is the source of the money and its opposing account the
/// destination. A positive leg is the other way around.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionTransformer;

impl Transformer for TransactionTransformer {
    type Entity = CollectedTransaction;

    const RESOURCE_TYPE: &'static str = "transactions";
    const AVAILABLE_INCLUDES: &'static [&'static str] = &["attachments", "user", "piggy_bank_events"];

    fn transform(&self, transaction: &CollectedTransaction) -> Map<String, Value> {
        let (source, destination) = if transaction.amount < 0.0 {
            (Some(&transaction.account), transaction.opposing_account.as_ref())
        } else {
            (transaction.opposing_account.as_ref(), Some(&transaction.account))
        };

        let mut record = into_record(json!({
            "id": transaction.id,
            "updated_at": timestamp(transaction.updated_at),
            "created_at": timestamp(transaction.created_at),
            "description": transaction.description,
            "date": transaction.date.to_string(),
            "type": transaction.transaction_type.as_str(),
            "journal_id": transaction.journal_id,
            "amount": transaction.amount,
            "currency_id": transaction.currency_id,
            "currency_code": transaction.currency_code,
            "currency_symbol": transaction.currency_symbol,
            "currency_decimal_places": transaction.currency_decimal_places,
            "notes": transaction.notes,
            "category_id": transaction.category.as_ref().map(|(id, _)| id),
            "category_name": transaction.category.as_ref().map(|(_, name)| name),
            "budget_id": transaction.budget.as_ref().map(|(id, _)| id),
            "budget_name": transaction.budget.as_ref().map(|(_, name)| name),
            "links": self_link(format!("/transactions/{}", transaction.id)),
        }));

        insert_account(&mut record, "source", source);
        insert_account(&mut record, "destination", destination);

        record
    }
}

fn insert_account(record: &mut Map<String, Value>, prefix: &str, account: Option<&AccountSummary>) {
    record.insert(format!("{prefix}_id"), json!(account.map(|account| account.id)));
    record.insert(
        format!("{prefix}_name"),
        json!(account.map(|account| &account.name)),
    );
    record.insert(
        format!("{prefix}_iban"),
        json!(account.and_then(|account| account.iban.as_ref())),
    );
    record.insert(
        format!("{prefix}_type"),
        json!(account.map(|account| account.account_type.as_str())),
    );
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use time::macros::{date, datetime};

    use crate::{
        account::AccountType,
        transaction::{AccountSummary, CollectedTransaction, TransactionType},
        transformer::{TransactionTransformer, Transformer},
    };

    fn leg(amount: f64, opposing: Option<AccountSummary>) -> CollectedTransaction {
        CollectedTransaction {
            id: 11,
            journal_id: 5,
            amount,
            created_at: datetime!(2024-03-01 09:00:00 UTC),
            updated_at: datetime!(2024-03-01 09:00:00 UTC),
            transaction_type: TransactionType::Withdrawal,
            description: "Groceries".to_owned(),
            date: date!(2024 - 03 - 01),
            notes: None,
            account: AccountSummary {
                id: 1,
                name: "Checking".to_owned(),
                iban: Some("NL02ABNA0123456789".to_owned()),
                account_type: AccountType::Asset,
            },
            currency_id: 1,
            currency_code: "EUR".to_owned(),
            currency_symbol: "€".to_owned(),
            currency_decimal_places: 2,
            opposing_account: opposing,
            category: Some((3, "Food".to_owned())),
            budget: None,
        }
    }

    fn shop() -> AccountSummary {
        AccountSummary {
            id: 2,
            name: "Shop".to_owned(),
            iban: None,
            account_type: AccountType::Expense,
        }
    }

    #[test]
    fn negative_leg_is_the_source() {
        let record = TransactionTransformer.transform(&leg(-10.0, Some(shop())));

        assert_eq!(record["source_id"], json!(1));
        assert_eq!(record["source_iban"], json!("NL02ABNA0123456789"));
        assert_eq!(record["destination_id"], json!(2));
        assert_eq!(record["destination_type"], json!("expense"));
    }

    #[test]
    fn positive_leg_is_the_destination() {
        let record = TransactionTransformer.transform(&leg(10.0, Some(shop())));

        assert_eq!(record["source_id"], json!(2));
        assert_eq!(record["destination_id"], json!(1));
    }

    #[test]
    fn missing_opposing_account_renders_null() {
        let record = TransactionTransformer.transform(&leg(-10.0, None));

        assert_eq!(record["destination_id"], Value::Null);
        assert_eq!(record["destination_name"], Value::Null);
    }

    #[test]
    fn renders_scalars_and_link() {
        let record = TransactionTransformer.transform(&leg(-10.0, None));

        assert_eq!(record["id"], json!(11));
        assert_eq!(record["date"], json!("2024-03-01"));
        assert_eq!(record["type"], json!("withdrawal"));
        assert_eq!(record["created_at"], json!("2024-03-01T09:00:00Z"));
        assert_eq!(record["category_name"], json!("Food"));
        assert_eq!(record["budget_id"], Value::Null);
        assert_eq!(
            record["links"],
            json!([{ "rel": "self", "uri": "/transactions/11" }])
        );
    }
}
