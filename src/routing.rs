//! Application router configuration.

use axum::{
    Router,
    http::Uri,
    middleware,
    routing::{get, post},
};

use crate::{
    AppState, Error,
    auth::auth_guard,
    budget::{create_budget_endpoint, get_budget_endpoint, get_budgets_endpoint},
    endpoints,
    import_job::{
        configure_import_job_endpoint, create_import_job_endpoint,
        get_import_job_configuration_endpoint, get_import_job_endpoint,
    },
    transaction::{
        delete_transaction_endpoint, get_transaction_attachments_endpoint,
        get_transaction_endpoint, get_transaction_piggy_bank_events_endpoint,
        get_transactions_endpoint, store_transaction_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every API route requires a bearer token and is served under [endpoints::API_PREFIX].
pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(store_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .patch(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION_ATTACHMENTS,
            get(get_transaction_attachments_endpoint),
        )
        .route(
            endpoints::TRANSACTION_PIGGY_BANK_EVENTS,
            get(get_transaction_piggy_bank_events_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(get_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(endpoints::BUDGET, get(get_budget_endpoint))
        .route(endpoints::IMPORT_JOBS, post(create_import_job_endpoint))
        .route(endpoints::IMPORT_JOB, get(get_import_job_endpoint))
        .route(
            endpoints::IMPORT_JOB_CONFIGURATION,
            get(get_import_job_configuration_endpoint).post(configure_import_job_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    Router::new()
        .nest(endpoints::API_PREFIX, protected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found(uri: Uri) -> Error {
    tracing::debug!("No route for {uri}.");
    Error::NotFound
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;

    use crate::{
        endpoints,
        test_utils::{
            TEST_TOKEN, assert_json_api, get_test_connection, get_test_server, insert_test_user,
        },
    };

    #[tokio::test]
    async fn unknown_route_is_json_api_not_found() {
        let conn = get_test_connection();
        insert_test_user(&conn);
        let (server, _) = get_test_server(conn);

        let response = server
            .get("/api/v1/coffee")
            .authorization_bearer(TEST_TOKEN)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_json_api(&response);
    }

    #[tokio::test]
    async fn api_routes_require_token() {
        let conn = get_test_connection();
        let (server, _) = get_test_server(conn);

        for path in [endpoints::TRANSACTIONS, endpoints::BUDGETS] {
            let response = server
                .get(&format!("{}{}", endpoints::API_PREFIX, path))
                .await;

            response.assert_status(StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn routes_are_not_served_without_prefix() {
        let conn = get_test_connection();
        insert_test_user(&conn);
        let (server, _) = get_test_server(conn);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(TEST_TOKEN)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
