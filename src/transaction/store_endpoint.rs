use axum::{
    Extension,
    extract::{Query, State},
};

use crate::{
    Error, UserID,
    event::JournalEvent,
    json_api::{ApiJson, Document},
    transaction::{
        TransactionRequest,
        render::{IncludeParams, TransactionState, render_journal},
        store_journal,
    },
    transformer::{Includes, TransactionTransformer},
};

/// Store a new journal and render it the same way as the show endpoint.
pub async fn store_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<IncludeParams>,
    ApiJson(request): ApiJson<TransactionRequest>,
) -> Result<Document, Error> {
    let includes = Includes::resolve::<TransactionTransformer>(params.include.as_deref())?;
    let data = request
        .validate()
        .inspect_err(|error| tracing::warn!("Rejected new transaction: {error}"))?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let journal = store_journal(user_id, &data, &connection)?;
    state.events.emit(JournalEvent::Stored(journal.id));

    render_journal(&journal, &includes, user_id, &state.serializer, &connection)
}
