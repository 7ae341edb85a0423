use serde_json::{Map, Value, json};

use crate::{
    piggy_bank::{PiggyBank, PiggyBankEvent},
    transformer::{Transformer, into_record, self_link, timestamp},
};

/// Renders piggy banks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PiggyBankTransformer;

impl Transformer for PiggyBankTransformer {
    type Entity = PiggyBank;

    const RESOURCE_TYPE: &'static str = "piggy_banks";
    const AVAILABLE_INCLUDES: &'static [&'static str] = &[];

    fn transform(&self, piggy_bank: &PiggyBank) -> Map<String, Value> {
        into_record(json!({
            "id": piggy_bank.id,
            "updated_at": timestamp(piggy_bank.updated_at),
            "created_at": timestamp(piggy_bank.created_at),
            "name": piggy_bank.name,
            "account_id": piggy_bank.account_id,
            "target_amount": piggy_bank.target_amount,
            "links": self_link(format!("/piggy_banks/{}", piggy_bank.id)),
        }))
    }
}

/// Renders piggy bank events.
#[derive(Debug, Clone, Copy, Default)]
pub struct PiggyBankEventTransformer;

impl Transformer for PiggyBankEventTransformer {
    type Entity = PiggyBankEvent;

    const RESOURCE_TYPE: &'static str = "piggy_bank_events";
    const AVAILABLE_INCLUDES: &'static [&'static str] = &["piggy_bank"];

    fn transform(&self, event: &PiggyBankEvent) -> Map<String, Value> {
        into_record(json!({
            "id": event.id,
            "updated_at": timestamp(event.updated_at),
            "created_at": timestamp(event.created_at),
            "piggy_bank_id": event.piggy_bank_id,
            "piggy_bank_name": event.piggy_bank_name,
            "transaction_journal_id": event.journal_id,
            "amount": event.amount,
            "date": event.date.to_string(),
            "links": self_link(format!("/piggy_bank_events/{}", event.id)),
        }))
    }
}
