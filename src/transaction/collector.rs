//! Collects a user's transaction legs with the related data needed to render them.
//!
//! A [TransactionQuery] is an immutable description of what to fetch. Each
//! builder method consumes the query and returns a new one, and executing a
//! query never changes it.

use std::collections::BTreeSet;

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use time::{Date, OffsetDateTime};

use crate::{
    Error, UserID,
    account::AccountType,
    database_id::{AccountId, BudgetId, CategoryId, CurrencyId, JournalId, TransactionId},
    db::parse_column,
    pagination::Page,
    transaction::{TransactionFilter, TransactionType},
};

/// The parts of an account shown next to a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSummary {
    /// The ID of the account.
    pub id: AccountId,
    /// The display name.
    pub name: String,
    /// The international bank account number, if known.
    pub iban: Option<String>,
    /// What the account represents.
    pub account_type: AccountType,
}

/// A transaction leg joined with its journal, account and currency.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedTransaction {
    /// The ID of the leg.
    pub id: TransactionId,
    /// The journal the leg belongs to.
    pub journal_id: JournalId,
    /// Negative when money leaves [CollectedTransaction::account].
    pub amount: f64,
    /// When the leg was created.
    pub created_at: OffsetDateTime,
    /// When the leg was last changed.
    pub updated_at: OffsetDateTime,
    /// The kind of event.
    pub transaction_type: TransactionType,
    /// Text describing the event.
    pub description: String,
    /// When the event happened.
    pub date: Date,
    /// Free-form notes on the journal.
    pub notes: Option<String>,
    /// The account the amount is booked on.
    pub account: AccountSummary,
    /// The currency of the amount.
    pub currency_id: CurrencyId,
    /// The ISO 4217 code of the currency.
    pub currency_code: String,
    /// The display symbol of the currency.
    pub currency_symbol: String,
    /// The number of digits after the decimal point.
    pub currency_decimal_places: u8,
    /// The account on the other side of the journal, when requested.
    pub opposing_account: Option<AccountSummary>,
    /// The journal's category as `(id, name)`, when requested.
    pub category: Option<(CategoryId, String)>,
    /// The journal's budget as `(id, name)`, when requested.
    pub budget: Option<(BudgetId, String)>,
}

/// A description of which of a user's transaction legs to collect.
///
/// New queries exclude internal transfers, see [TransactionFilter::InternalTransfer].
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionQuery {
    user_id: UserID,
    with_opposing_account: bool,
    with_category: bool,
    with_budget: bool,
    all_asset_accounts: bool,
    range: Option<(Date, Date)>,
    types: Option<BTreeSet<TransactionType>>,
    journals: Option<BTreeSet<JournalId>>,
    budget_id: Option<BudgetId>,
    filters: BTreeSet<TransactionFilter>,
    limit: Option<u64>,
    page: u64,
}

impl TransactionQuery {
    /// Start a query over the transactions of `user_id`.
    pub fn new(user_id: UserID) -> Self {
        Self {
            user_id,
            with_opposing_account: false,
            with_category: false,
            with_budget: false,
            all_asset_accounts: false,
            range: None,
            types: None,
            journals: None,
            budget_id: None,
            filters: BTreeSet::from([TransactionFilter::InternalTransfer]),
            limit: None,
            page: 1,
        }
    }

    /// Load the account on the other side of each leg's journal.
    pub fn with_opposing_account(mut self) -> Self {
        self.with_opposing_account = true;
        self
    }

    /// Load the category of each leg's journal.
    pub fn with_category_information(mut self) -> Self {
        self.with_category = true;
        self
    }

    /// Load the budget of each leg's journal.
    pub fn with_budget_information(mut self) -> Self {
        self.with_budget = true;
        self
    }

    /// Only collect legs booked on the user's asset accounts.
    pub fn set_all_asset_accounts(mut self) -> Self {
        self.all_asset_accounts = true;
        self
    }

    /// Only collect legs of journals dated from `start` to `end`, inclusive.
    pub fn set_range(mut self, start: Date, end: Date) -> Self {
        self.range = Some((start, end));
        self
    }

    /// Only collect legs of journals with one of `types`.
    pub fn set_types(mut self, types: impl IntoIterator<Item = TransactionType>) -> Self {
        self.types = Some(types.into_iter().collect());
        self
    }

    /// Only collect legs of the journals with `journal_ids`.
    pub fn set_journals(mut self, journal_ids: impl IntoIterator<Item = JournalId>) -> Self {
        self.journals = Some(journal_ids.into_iter().collect());
        self
    }

    /// Only collect legs of journals assigned to `budget_id`.
    pub fn set_budget(mut self, budget_id: BudgetId) -> Self {
        self.budget_id = Some(budget_id);
        self
    }

    /// Apply `filter`. Adding a filter that is already applied does nothing.
    pub fn add_filter(mut self, filter: TransactionFilter) -> Self {
        self.filters.insert(filter);
        self
    }

    /// Stop applying `filter`. Removing a filter that is not applied does nothing.
    pub fn remove_filter(mut self, filter: TransactionFilter) -> Self {
        self.filters.remove(&filter);
        self
    }

    /// Put at most `limit` legs on a page. A limit of zero is treated as one.
    pub fn set_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit.max(1));
        self
    }

    /// Select the 1-indexed page to collect. Page zero is treated as page one.
    pub fn set_page(mut self, page: u64) -> Self {
        self.page = page.max(1);
        self
    }

    /// The filters the query applies.
    pub fn filters(&self) -> &BTreeSet<TransactionFilter> {
        &self.filters
    }

    /// Collect every matching leg, ignoring the limit and page.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    pub fn get_transactions(&self, connection: &Connection) -> Result<Vec<CollectedTransaction>, Error> {
        let (where_clause, parameters) = self.where_clause();
        let query = format!("{} {where_clause} {ORDER_BY}", self.select_clause());

        collect_rows(&query, parameters, connection)
    }

    /// Collect one page of matching legs.
    ///
    /// Without a limit, every matching leg is put on the first page.
    ///
    /// # Errors
    /// Returns [Error::InvalidRequest] if the page starts past the largest
    /// offset SQLite can represent, otherwise an error if there is an SQL error.
    pub fn get_paginated_transactions(
        &self,
        connection: &Connection,
    ) -> Result<Page<CollectedTransaction>, Error> {
        let (where_clause, parameters) = self.where_clause();

        let total: i64 = connection
            .prepare(&format!("SELECT COUNT(*) {FROM_CLAUSE} {where_clause}"))?
            .query_row(params_from_iter(parameters.iter()), |row| row.get(0))?;
        let total = total.max(0) as u64;

        let Some(limit) = self.limit else {
            let items = self.get_transactions(connection)?;

            return Ok(Page {
                items,
                total,
                current_page: 1,
                per_page: total.max(1),
            });
        };

        // SQLite integers are signed 64-bit.
        let sql_limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql_offset = (self.page - 1)
            .checked_mul(limit)
            .and_then(|offset| i64::try_from(offset).ok())
            .ok_or_else(|| Error::InvalidRequest(format!("page {} is out of range", self.page)))?;

        let mut parameters = parameters;
        parameters.push(Value::Integer(sql_limit));
        parameters.push(Value::Integer(sql_offset));

        let query = format!(
            "{} {where_clause} {ORDER_BY} LIMIT ? OFFSET ?",
            self.select_clause()
        );
        let items = collect_rows(&query, parameters, connection)?;

        Ok(Page {
            items,
            total,
            current_page: self.page,
            per_page: limit,
        })
    }

    fn select_clause(&self) -> String {
        let opposing_columns = if self.with_opposing_account {
            "o.id, o.name, o.iban, o.account_type"
        } else {
            "NULL, NULL, NULL, NULL"
        };
        let category_columns = if self.with_category {
            "cat.id, cat.name"
        } else {
            "NULL, NULL"
        };
        let budget_columns = if self.with_budget {
            "b.id, b.name"
        } else {
            "NULL, NULL"
        };

        let mut joins = Vec::new();
        if self.with_opposing_account {
            joins.push(
                "LEFT JOIN account o ON o.id = (
                    SELECT other_leg.account_id FROM \"transaction\" other_leg
                    WHERE other_leg.journal_id = t.journal_id AND other_leg.id != t.id
                    ORDER BY other_leg.id ASC LIMIT 1
                )",
            );
        }
        if self.with_category {
            joins.push("LEFT JOIN category cat ON cat.id = j.category_id");
        }
        if self.with_budget {
            joins.push("LEFT JOIN budget b ON b.id = j.budget_id");
        }

        format!(
            "SELECT t.id, t.journal_id, t.amount, t.created_at, t.updated_at,
                j.transaction_type, j.description, j.date, j.notes,
                a.id, a.name, a.iban, a.account_type,
                c.id, c.code, c.symbol, c.decimal_places,
                {opposing_columns}, {category_columns}, {budget_columns}
            {FROM_CLAUSE} {}",
            joins.join(" ")
        )
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut conditions = vec!["j.user_id = ?".to_owned()];
        let mut parameters = vec![Value::Integer(self.user_id.as_i64())];

        if self.all_asset_accounts {
            conditions.push(format!(
                "a.account_type = '{}'",
                AccountType::Asset.as_str()
            ));
        }

        if let Some((start, end)) = self.range {
            conditions.push("j.date >= ? AND j.date <= ?".to_owned());
            parameters.push(Value::Text(start.to_string()));
            parameters.push(Value::Text(end.to_string()));
        }

        if let Some(types) = &self.types {
            conditions.push(format!("j.transaction_type IN ({})", placeholders(types.len())));
            parameters.extend(
                types
                    .iter()
                    .map(|transaction_type| Value::Text(transaction_type.as_str().to_owned())),
            );
        }

        if let Some(journals) = &self.journals {
            conditions.push(format!("j.id IN ({})", placeholders(journals.len())));
            parameters.extend(journals.iter().map(|&journal_id| Value::Integer(journal_id)));
        }

        if let Some(budget_id) = self.budget_id {
            conditions.push("j.budget_id = ?".to_owned());
            parameters.push(Value::Integer(budget_id));
        }

        conditions.extend(
            self.filters
                .iter()
                .filter_map(|filter| filter.sql_condition(self.all_asset_accounts))
                .map(str::to_owned),
        );

        (format!("WHERE {}", conditions.join(" AND ")), parameters)
    }
}

const FROM_CLAUSE: &str = "FROM \"transaction\" t
    INNER JOIN transaction_journal j ON j.id = t.journal_id
    INNER JOIN account a ON a.id = t.account_id
    INNER JOIN transaction_currency c ON c.id = t.currency_id";

// Newest first, and then ID to keep the order stable for journals on the same day.
const ORDER_BY: &str = "ORDER BY j.date DESC, j.id DESC, t.id ASC";

/// An empty set yields `NULL`, which matches nothing.
fn placeholders(count: usize) -> String {
    if count == 0 {
        return "NULL".to_owned();
    }

    vec!["?"; count].join(", ")
}

fn collect_rows(
    query: &str,
    parameters: Vec<Value>,
    connection: &Connection,
) -> Result<Vec<CollectedTransaction>, Error> {
    connection
        .prepare(query)?
        .query_map(params_from_iter(parameters), map_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

fn map_row(row: &Row) -> Result<CollectedTransaction, rusqlite::Error> {
    let opposing_account = match row.get::<_, Option<AccountId>>(17)? {
        Some(id) => Some(AccountSummary {
            id,
            name: row.get(18)?,
            iban: row.get(19)?,
            account_type: parse_column(row, 20)?,
        }),
        None => None,
    };

    let category = match row.get::<_, Option<CategoryId>>(21)? {
        Some(id) => Some((id, row.get(22)?)),
        None => None,
    };

    let budget = match row.get::<_, Option<BudgetId>>(23)? {
        Some(id) => Some((id, row.get(24)?)),
        None => None,
    };

    Ok(CollectedTransaction {
        id: row.get(0)?,
        journal_id: row.get(1)?,
        amount: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        transaction_type: parse_column(row, 5)?,
        description: row.get(6)?,
        date: row.get(7)?,
        notes: row.get(8)?,
        account: AccountSummary {
            id: row.get(9)?,
            name: row.get(10)?,
            iban: row.get(11)?,
            account_type: parse_column(row, 12)?,
        },
        currency_id: row.get(13)?,
        currency_code: row.get(14)?,
        currency_symbol: row.get(15)?,
        currency_decimal_places: row.get(16)?,
        opposing_account,
        category,
        budget,
    })
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
            JournalData, TransactionFilter, TransactionQuery, TransactionType, store_journal,
        },
    };

    #[test]
    fn new_query_excludes_internal_transfers() {
        let query = TransactionQuery::new(crate::UserID::new(1));

        assert!(query.filters().contains(&TransactionFilter::InternalTransfer));
    }

    #[test]
    fn filters_are_deduplicated_and_removal_is_idempotent() {
        let query = TransactionQuery::new(crate::UserID::new(1))
            .add_filter(TransactionFilter::PositiveAmount)
            .add_filter(TransactionFilter::PositiveAmount)
            .remove_filter(TransactionFilter::NegativeAmount);

        assert_eq!(query.filters().len(), 2);

        let removed_twice = query
            .clone()
            .remove_filter(TransactionFilter::InternalTransfer)
            .remove_filter(TransactionFilter::InternalTransfer);
        assert_eq!(removed_twice.filters().len(), 1);
    }

    #[test]
    fn builder_does_not_change_earlier_queries() {
        let base = TransactionQuery::new(crate::UserID::new(1));

        let narrowed = base.clone().set_types([TransactionType::Transfer]);

        assert_ne!(base, narrowed);
        assert_eq!(base, TransactionQuery::new(crate::UserID::new(1)));
    }

    #[test]
    fn collects_both_legs_with_related_data() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        create_budget(user.id, "Groceries", &conn).unwrap();
        let data = JournalData {
            budget_name: Some("Groceries".to_owned()),
            category_name: Some("Food".to_owned()),
            ..withdrawal_data(&conn, user.id, 10.0)
        };
        let journal = store_journal(user.id, &data, &conn).unwrap();

        let transactions = TransactionQuery::new(user.id)
            .with_opposing_account()
            .with_category_information()
            .with_budget_information()
            .set_journals([journal.id])
            .get_transactions(&conn)
            .unwrap();

        assert_eq!(transactions.len(), 2);
        let source_leg = &transactions[0];
        assert_eq!(source_leg.amount, -10.0);
        assert_eq!(source_leg.account.id, data.source_id);
        assert_eq!(
            source_leg.opposing_account.as_ref().map(|account| account.id),
            Some(data.destination_id)
        );
        assert_eq!(
            source_leg.category.as_ref().map(|(_, name)| name.as_str()),
            Some("Food")
        );
        assert_eq!(
            source_leg.budget.as_ref().map(|(_, name)| name.as_str()),
            Some("Groceries")
        );
        assert_eq!(source_leg.currency_code, "EUR");
    }

    #[test]
    fn related_data_is_only_loaded_on_request() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let data = JournalData {
            category_name: Some("Food".to_owned()),
            ..withdrawal_data(&conn, user.id, 10.0)
        };
        store_journal(user.id, &data, &conn).unwrap();

        let transactions = TransactionQuery::new(user.id).get_transactions(&conn).unwrap();

        assert!(transactions.iter().all(|transaction| {
            transaction.opposing_account.is_none() && transaction.category.is_none()
        }));
    }

    #[test]
    fn amount_filters_keep_one_leg() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let journal = store_journal(user.id, &withdrawal_data(&conn, user.id, 10.0), &conn).unwrap();
        let query = TransactionQuery::new(user.id).set_journals([journal.id]);

        let positive = query
            .clone()
            .add_filter(TransactionFilter::PositiveAmount)
            .get_transactions(&conn)
            .unwrap();
        let negative = query
            .add_filter(TransactionFilter::NegativeAmount)
            .get_transactions(&conn)
            .unwrap();

        assert_eq!(positive.len(), 1);
        assert_eq!(positive[0].amount, 10.0);
        assert_eq!(negative.len(), 1);
        assert_eq!(negative[0].amount, -10.0);
    }

    #[test]
    fn internal_transfer_filter_applies_to_asset_scope() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let checking = insert_account(&conn, user.id, "Checking", AccountType::Asset);
        let savings = insert_account(&conn, user.id, "Savings", AccountType::Asset);
        let transfer = JournalData {
            transaction_type: TransactionType::Transfer,
            source_id: checking.id,
            destination_id: savings.id,
            ..withdrawal_data(&conn, user.id, 10.0)
        };
        let journal = store_journal(user.id, &transfer, &conn).unwrap();

        let scoped = TransactionQuery::new(user.id)
            .set_all_asset_accounts()
            .get_transactions(&conn)
            .unwrap();
        let unfiltered = TransactionQuery::new(user.id)
            .set_all_asset_accounts()
            .remove_filter(TransactionFilter::InternalTransfer)
            .get_transactions(&conn)
            .unwrap();
        let by_journal = TransactionQuery::new(user.id)
            .set_journals([journal.id])
            .get_transactions(&conn)
            .unwrap();

        assert!(scoped.is_empty());
        assert_eq!(unfiltered.len(), 2);
        assert_eq!(by_journal.len(), 2);
    }

    #[test]
    fn range_types_and_user_scope() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let other = insert_user(&conn, "other@example.com", "other-token");
        for (day, owner) in [(1, user.id), (15, user.id), (28, user.id), (15, other.id)] {
            let data = JournalData {
                date: time::Date::from_calendar_date(2024, time::Month::March, day).unwrap(),
                ..withdrawal_data(&conn, owner, 10.0)
            };
            store_journal(owner, &data, &conn).unwrap();
        }

        let in_range = TransactionQuery::new(user.id)
            .set_all_asset_accounts()
            .set_range(date!(2024 - 03 - 01), date!(2024 - 03 - 15))
            .get_transactions(&conn)
            .unwrap();
        let deposits = TransactionQuery::new(user.id)
            .set_types([TransactionType::Deposit])
            .get_transactions(&conn)
            .unwrap();

        let dates: Vec<_> = in_range.iter().map(|transaction| transaction.date).collect();
        assert_eq!(dates, vec![date!(2024 - 03 - 15), date!(2024 - 03 - 01)]);
        assert!(deposits.is_empty());
    }

    #[test]
    fn paginates_newest_first() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        for day in 1..=5 {
            let data = JournalData {
                date: time::Date::from_calendar_date(2024, time::Month::March, day).unwrap(),
                ..withdrawal_data(&conn, user.id, 10.0)
            };
            store_journal(user.id, &data, &conn).unwrap();
        }
        let query = TransactionQuery::new(user.id)
            .set_all_asset_accounts()
            .set_limit(2);

        let first = query.clone().set_page(1).get_paginated_transactions(&conn).unwrap();
        let last = query.set_page(3).get_paginated_transactions(&conn).unwrap();

        assert_eq!(first.total, 5);
        assert_eq!(first.total_pages(), 3);
        assert_eq!(
            first.items.iter().map(|item| item.date).collect::<Vec<_>>(),
            vec![date!(2024 - 03 - 05), date!(2024 - 03 - 04)]
        );
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].date, date!(2024 - 03 - 01));
    }

    #[test]
    fn huge_limit_and_page_do_not_reach_sql() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        store_journal(user.id, &withdrawal_data(&conn, user.id, 10.0), &conn).unwrap();
        let query = TransactionQuery::new(user.id).set_all_asset_accounts();

        let everything = query
            .clone()
            .set_limit(u64::MAX)
            .get_paginated_transactions(&conn)
            .unwrap();
        let past_the_end = query
            .clone()
            .set_limit(2)
            .set_page(i64::MAX as u64)
            .get_paginated_transactions(&conn);
        let empty_page = query
            .set_limit(1)
            .set_page(1000)
            .get_paginated_transactions(&conn)
            .unwrap();

        assert_eq!(everything.items.len(), 1);
        assert!(matches!(past_the_end, Err(Error::InvalidRequest(_))));
        assert!(empty_page.items.is_empty());
        assert_eq!(empty_page.total, 1);
    }

    #[test]
    fn empty_journal_set_matches_nothing() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        store_journal(user.id, &withdrawal_data(&conn, user.id, 10.0), &conn).unwrap();

        let transactions = TransactionQuery::new(user.id)
            .set_journals([])
            .get_transactions(&conn)
            .unwrap();

        assert!(transactions.is_empty());
    }
}
