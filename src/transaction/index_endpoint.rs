use axum::{
    Extension,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    Error, UserID,
    endpoints,
    json_api::Document,
    preferences::get_list_page_size,
    transaction::{
        TransactionFilter, TransactionQuery, TransactionType, map_transaction_types,
        render::{TransactionState, render_transactions},
        request::parse_date,
    },
    transformer::{Includes, TransactionTransformer},
};

/// The query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    /// Which transaction types to list, see [map_transaction_types].
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// The first date to include, `YYYY-MM-DD`.
    pub start: Option<String>,
    /// The last date to include, `YYYY-MM-DD`.
    pub end: Option<String>,
    /// The 1-indexed page number.
    pub page: Option<u64>,
    /// Comma separated names of related resources.
    pub include: Option<String>,
}

impl IndexParams {
    /// The parameters every pagination link keeps.
    fn link_params(&self) -> Vec<(&'static str, String)> {
        [
            ("type", &self.transaction_type),
            ("start", &self.start),
            ("end", &self.end),
            ("include", &self.include),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.clone().map(|value| (name, value)))
        .collect()
    }
}

/// List one page of the user's transactions on their asset accounts.
///
/// The date range is only applied when both `start` and `end` are given.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<IndexParams>,
) -> Result<Document, Error> {
    let includes = Includes::resolve::<TransactionTransformer>(params.include.as_deref())?;
    let types = map_transaction_types(params.transaction_type.as_deref());
    let range = match (params.start.as_deref(), params.end.as_deref()) {
        (Some(start), Some(end)) => Some((parse_date(start)?, parse_date(end)?)),
        _ => None,
    };
    let page = params.page.unwrap_or(state.pagination_config.default_page);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let page_size = get_list_page_size(
        user_id,
        state.pagination_config.default_page_size,
        &connection,
    )?;

    let mut query = TransactionQuery::new(user_id)
        .with_opposing_account()
        .with_category_information()
        .with_budget_information()
        .set_all_asset_accounts()
        .set_limit(page_size)
        .set_page(page);

    if types.contains(&TransactionType::Transfer) {
        query = query.remove_filter(TransactionFilter::InternalTransfer);
    }

    query = query.set_types(types);

    if let Some((start, end)) = range {
        query = query.set_range(start, end);
    }

    let transactions = query.get_paginated_transactions(&connection)?;
    let (resources, included) = render_transactions(
        &transactions.items,
        &includes,
        user_id,
        &state.serializer,
        &connection,
    )?;

    let url = format!("{}{}", state.serializer.base_url(), endpoints::TRANSACTIONS);
    let mut document = state
        .serializer
        .collection(resources)
        .with_meta("pagination", transactions.meta())
        .with_links(transactions.links(&url, &params.link_params()));
    document.include(included);

    Ok(document)
}
