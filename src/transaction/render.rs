//! Shared state and rendering for the transaction endpoints.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserID,
    attachment::get_journal_attachments,
    event::EventBus,
    json_api::{Document, JsonApiSerializer, Resource},
    pagination::PaginationConfig,
    piggy_bank::get_journal_piggy_bank_events,
    transaction::{
        CollectedTransaction, Journal, TransactionFilter, TransactionQuery, TransactionType,
    },
    transformer::{
        AttachmentTransformer, Includes, PiggyBankEventTransformer, TransactionTransformer,
        Transformer, UserTransformer,
    },
    user::get_user_by_id,
};

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Builds the JSON:API documents.
    pub serializer: JsonApiSerializer,
    /// The default page number and size.
    pub pagination_config: PaginationConfig,
    /// Where stored and updated journals are announced.
    pub events: EventBus,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            serializer: state.serializer(),
            pagination_config: state.pagination_config.clone(),
            events: state.events.clone(),
        }
    }
}

/// The `include` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct IncludeParams {
    /// Comma separated names of related resources.
    pub include: Option<String>,
}

/// Render transaction legs as resources, adding the requested relations.
///
/// Returns the primary resources and the related resources for `included`.
pub(crate) fn render_transactions(
    transactions: &[CollectedTransaction],
    includes: &Includes,
    user_id: UserID,
    serializer: &JsonApiSerializer,
    connection: &Connection,
) -> Result<(Vec<Resource>, Vec<Resource>), Error> {
    let mut resources = Vec::with_capacity(transactions.len());
    let mut included = Vec::new();

    let user = if includes.contains("user") {
        Some(UserTransformer.resource(serializer, &get_user_by_id(user_id, connection)?))
    } else {
        None
    };

    for transaction in transactions {
        let mut resource = TransactionTransformer.resource(serializer, transaction);

        if let Some(user) = &user {
            resource.relate_one("user", user);
        }

        if includes.contains("attachments") {
            let attachments = get_journal_attachments(user_id, transaction.journal_id, connection)?;
            let attachments = AttachmentTransformer.resources(serializer, &attachments);
            resource.relate_many("attachments", &attachments);
            included.extend(attachments);
        }

        if includes.contains("piggy_bank_events") {
            let events =
                get_journal_piggy_bank_events(user_id, transaction.journal_id, connection)?;
            let events = PiggyBankEventTransformer.resources(serializer, &events);
            resource.relate_many("piggy_bank_events", &events);
            included.extend(events);
        }

        resources.push(resource);
    }

    included.extend(user);

    Ok((resources, included))
}

/// Render the user-facing leg of a journal.
///
/// A withdrawal is shown by its positive leg and every other type by its negative leg.
pub(crate) fn render_journal(
    journal: &Journal,
    includes: &Includes,
    user_id: UserID,
    serializer: &JsonApiSerializer,
    connection: &Connection,
) -> Result<Document, Error> {
    let sign_filter = if journal.transaction_type == TransactionType::Withdrawal {
        TransactionFilter::PositiveAmount
    } else {
        TransactionFilter::NegativeAmount
    };

    let transactions = TransactionQuery::new(user_id)
        .with_opposing_account()
        .with_category_information()
        .with_budget_information()
        .set_journals([journal.id])
        .add_filter(sign_filter)
        .get_transactions(connection)?;

    let (resources, included) =
        render_transactions(&transactions, includes, user_id, serializer, connection)?;

    let mut document = serializer.collection(resources);
    document.include(included);

    Ok(document)
}
