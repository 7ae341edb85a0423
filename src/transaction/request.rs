//! The request body for storing and updating transactions.

use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    database_id::{AccountId, BudgetId, CategoryId, CurrencyId},
    transaction::{JournalData, TransactionType},
};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
/// Returns [Error::InvalidDate] if `text` is not a valid date in that format.
pub fn parse_date(text: &str) -> Result<Date, Error> {
    Date::parse(text.trim(), DATE_FORMAT).map_err(|_| Error::InvalidDate(text.to_owned()))
}

/// Amounts may be sent as JSON numbers or as decimal strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    /// e.g. `12.5`
    Number(f64),
    /// e.g. `"12.50"`
    Text(String),
}

/// The request body for storing or updating a transaction journal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionRequest {
    /// "withdrawal", "deposit" or "transfer".
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// Text describing the transaction.
    pub description: String,
    /// The date as `YYYY-MM-DD`.
    pub date: String,
    /// The strictly positive amount.
    pub amount: AmountInput,
    /// Where the money comes from.
    pub source_id: Option<AccountId>,
    /// Where the money goes.
    pub destination_id: Option<AccountId>,
    /// The currency, the user's default currency when absent.
    #[serde(default)]
    pub currency_id: Option<CurrencyId>,
    /// The budget to assign, withdrawals only.
    #[serde(default)]
    pub budget_id: Option<BudgetId>,
    /// The budget to assign when `budget_id` does not match.
    #[serde(default)]
    pub budget_name: Option<String>,
    /// The category to file under.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// The category to file under, created when missing.
    #[serde(default)]
    pub category_name: Option<String>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl TransactionRequest {
    /// Check the request and convert it into journal data.
    ///
    /// # Errors
    /// Returns [Error::InvalidRequest] or [Error::InvalidDate] describing the first problem found.
    pub fn validate(self) -> Result<JournalData, Error> {
        let transaction_type = match self.transaction_type.as_str() {
            "withdrawal" => TransactionType::Withdrawal,
            "deposit" => TransactionType::Deposit,
            "transfer" => TransactionType::Transfer,
            other => {
                return Err(Error::InvalidRequest(format!(
                    "type must be one of withdrawal, deposit or transfer, got \"{other}\""
                )));
            }
        };

        let description = self.description.trim();
        if description.is_empty() {
            return Err(Error::InvalidRequest(
                "description must not be empty".to_owned(),
            ));
        }

        let amount = match &self.amount {
            AmountInput::Number(amount) => Some(*amount),
            AmountInput::Text(text) => text.trim().parse::<f64>().ok(),
        }
        .filter(|amount| amount.is_finite() && *amount > 0.0)
        .ok_or_else(|| Error::InvalidRequest("amount must be a positive number".to_owned()))?;

        let date = parse_date(&self.date)?;

        let source_id = self
            .source_id
            .ok_or_else(|| Error::InvalidRequest("source_id is required".to_owned()))?;
        let destination_id = self
            .destination_id
            .ok_or_else(|| Error::InvalidRequest("destination_id is required".to_owned()))?;

        Ok(JournalData {
            transaction_type,
            description: description.to_owned(),
            date,
            amount,
            source_id,
            destination_id,
            currency_id: self.currency_id,
            budget_id: self.budget_id,
            budget_name: self.budget_name,
            category_id: self.category_id,
            category_name: self.category_name,
            notes: self.notes.filter(|notes| !notes.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Error,
        transaction::{TransactionRequest, TransactionType, parse_date},
    };

    fn request(body: serde_json::Value) -> TransactionRequest {
        serde_json::from_value(body).unwrap()
    }

    fn valid_body() -> serde_json::Value {
        json!({
            "type": "withdrawal",
            "description": "Groceries",
            "date": "2024-03-01",
            "amount": "12.50",
            "source_id": 1,
            "destination_id": 2,
        })
    }

    #[test]
    fn valid_request_converts() {
        let data = request(valid_body()).validate().unwrap();

        assert_eq!(data.transaction_type, TransactionType::Withdrawal);
        assert_eq!(data.amount, 12.5);
        assert_eq!(data.date, date!(2024 - 03 - 01));
        assert_eq!(data.budget_id, None);
    }

    #[test]
    fn numeric_amount_is_accepted() {
        let mut body = valid_body();
        body["amount"] = json!(7);

        assert_eq!(request(body).validate().unwrap().amount, 7.0);
    }

    #[test]
    fn rejects_opening_balance_type() {
        let mut body = valid_body();
        body["type"] = json!("opening_balance");

        assert!(matches!(
            request(body).validate(),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn rejects_non_positive_amount() {
        for amount in [json!("0"), json!(-3), json!("abc")] {
            let mut body = valid_body();
            body["amount"] = amount;

            assert!(matches!(
                request(body).validate(),
                Err(Error::InvalidRequest(_))
            ));
        }
    }

    #[test]
    fn rejects_blank_description() {
        let mut body = valid_body();
        body["description"] = json!("  ");

        assert!(matches!(
            request(body).validate(),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn rejects_missing_account() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("destination_id");

        assert!(matches!(
            request(body).validate(),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn rejects_bad_date() {
        assert_eq!(
            parse_date("01/03/2024"),
            Err(Error::InvalidDate("01/03/2024".to_owned()))
        );
    }
}
