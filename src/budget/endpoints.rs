use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserID,
    budget::{Budget, create_budget, find_budget, get_all_budgets},
    database_id::BudgetId,
    json_api::{ApiJson, Document, JsonApiSerializer, Resource},
    transaction::{TransactionFilter, TransactionQuery, TransactionType, render_transactions},
    transformer::{BudgetTransformer, Includes, Transformer, UserTransformer},
    user::get_user_by_id,
};

/// The state needed by the budget endpoints.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Builds the JSON:API documents.
    pub serializer: JsonApiSerializer,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            serializer: state.serializer(),
        }
    }
}

/// The `include` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct BudgetParams {
    /// Comma separated names of related resources.
    pub include: Option<String>,
}

/// The request body for creating a budget.
#[derive(Debug, Deserialize)]
pub struct NewBudgetRequest {
    /// The name of the new budget.
    pub name: String,
}

/// List the user's budgets ordered by name.
pub async fn get_budgets_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<BudgetParams>,
) -> Result<Document, Error> {
    let includes = Includes::resolve::<BudgetTransformer>(params.include.as_deref())?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budgets = get_all_budgets(user_id, &connection)?;
    let (resources, included) =
        render_budgets(&budgets, &includes, user_id, &state.serializer, &connection)?;

    let mut document = state.serializer.collection(resources);
    document.include(included);

    Ok(document)
}

/// Show one of the user's budgets.
pub async fn get_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
    Query(params): Query<BudgetParams>,
) -> Result<Document, Error> {
    let includes = Includes::resolve::<BudgetTransformer>(params.include.as_deref())?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = find_budget(user_id, budget_id, &connection)?.ok_or(Error::NotFound)?;
    let (mut resources, included) = render_budgets(
        std::slice::from_ref(&budget),
        &includes,
        user_id,
        &state.serializer,
        &connection,
    )?;

    let Some(resource) = resources.pop() else {
        return Err(Error::NotFound);
    };
    let mut document = state.serializer.item(resource);
    document.include(included);

    Ok(document)
}

/// Create a budget for the user.
pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(request): ApiJson<NewBudgetRequest>,
) -> Result<Document, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = create_budget(user_id, &request.name, &connection)?;
    tracing::info!("Created budget {} for user {user_id}.", budget.id);

    Ok(state
        .serializer
        .item(BudgetTransformer.resource(&state.serializer, &budget)))
}

fn render_budgets(
    budgets: &[Budget],
    includes: &Includes,
    user_id: UserID,
    serializer: &JsonApiSerializer,
    connection: &Connection,
) -> Result<(Vec<Resource>, Vec<Resource>), Error> {
    let mut resources = Vec::with_capacity(budgets.len());
    let mut included = Vec::new();

    let user = if includes.contains("user") {
        Some(UserTransformer.resource(serializer, &get_user_by_id(user_id, connection)?))
    } else {
        None
    };

    for budget in budgets {
        let mut resource = BudgetTransformer.resource(serializer, budget);

        if let Some(user) = &user {
            resource.relate_one("user", user);
        }

        if includes.contains("transactions") {
            // The expense side of each withdrawal.
            let transactions = TransactionQuery::new(user_id)
                .with_opposing_account()
                .with_category_information()
                .with_budget_information()
                .set_types([TransactionType::Withdrawal])
                .set_budget(budget.id)
                .add_filter(TransactionFilter::PositiveAmount)
                .get_transactions(connection)?;
            let (transactions, _) = render_transactions(
                &transactions,
                &Includes::default(),
                user_id,
                serializer,
                connection,
            )?;

            resource.relate_many("transactions", &transactions);
            included.extend(transactions);
        }

        resources.push(resource);
    }

    included.extend(user);

    Ok((resources, included))
}
