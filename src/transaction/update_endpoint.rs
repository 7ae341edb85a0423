use axum::{
    Extension,
    extract::{Path, Query, State},
};

use crate::{
    Error, UserID,
    database_id::TransactionId,
    event::JournalEvent,
    json_api::{ApiJson, Document},
    transaction::{
        TransactionRequest, find_journal_by_transaction,
        render::{IncludeParams, TransactionState, render_journal},
        update_journal,
    },
    transformer::{Includes, TransactionTransformer},
};

/// Replace the journal that owns `transaction_id` and render it the same way
/// as the show endpoint.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Query(params): Query<IncludeParams>,
    ApiJson(request): ApiJson<TransactionRequest>,
) -> Result<Document, Error> {
    let includes = Includes::resolve::<TransactionTransformer>(params.include.as_deref())?;
    let data = request
        .validate()
        .inspect_err(|error| tracing::warn!("Rejected update of transaction {transaction_id}: {error}"))?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let journal = find_journal_by_transaction(user_id, transaction_id, &connection)?;
    let journal = update_journal(user_id, &journal, &data, &connection)?;
    state.events.emit(JournalEvent::Updated(journal.id));

    render_journal(&journal, &includes, user_id, &state.serializer, &connection)
}
