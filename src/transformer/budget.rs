use serde_json::{Map, Value, json};

use crate::{
    budget::Budget,
    transformer::{Transformer, into_record, self_link, timestamp},
};

/// Renders budgets.
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetTransformer;

impl Transformer for BudgetTransformer {
    type Entity = Budget;

    const RESOURCE_TYPE: &'static str = "budgets";
    const AVAILABLE_INCLUDES: &'static [&'static str] = &["user", "transactions"];

    fn transform(&self, budget: &Budget) -> Map<String, Value> {
        into_record(json!({
            "id": budget.id,
            "updated_at": timestamp(budget.updated_at),
            "created_at": timestamp(budget.created_at),
            "name": budget.name,
            "active": budget.active,
            "links": self_link(format!("/budgets/{}", budget.id)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use crate::{
        UserID,
        budget::Budget,
        transformer::{BudgetTransformer, Transformer},
    };

    #[test]
    fn transforms_budget() {
        let budget = Budget {
            id: 4,
            user_id: UserID::new(1),
            name: "Groceries".to_owned(),
            active: true,
            created_at: datetime!(2024-01-01 00:00:00 UTC),
            updated_at: datetime!(2024-02-01 08:00:00 UTC),
        };

        let record = BudgetTransformer.transform(&budget);

        assert_eq!(
            serde_json::Value::Object(record),
            json!({
                "id": 4,
                "updated_at": "2024-02-01T08:00:00Z",
                "created_at": "2024-01-01T00:00:00Z",
                "name": "Groceries",
                "active": true,
                "links": [{ "rel": "self", "uri": "/budgets/4" }],
            })
        );
    }

    #[test]
    fn nothing_is_included_by_default() {
        assert!(BudgetTransformer::DEFAULT_INCLUDES.is_empty());
        assert_eq!(
            BudgetTransformer::AVAILABLE_INCLUDES,
            &["user", "transactions"]
        );
    }
}
