//! The API endpoints URIs.
//!
//! Every endpoint is served under [API_PREFIX].
//! For endpoints that take a parameter, e.g., '/budgets/{budget_id}', use [format_endpoint].

/// The prefix of every API route.
pub const API_PREFIX: &str = "/api/v1";

/// The route to list and store transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/transactions/{transaction_id}";
/// The route to list the attachments of a transaction.
pub const TRANSACTION_ATTACHMENTS: &str = "/transactions/{transaction_id}/attachments";
/// The route to list the piggy bank events of a transaction.
pub const TRANSACTION_PIGGY_BANK_EVENTS: &str = "/transactions/{transaction_id}/piggy-bank-events";
/// The route to list and create budgets.
pub const BUDGETS: &str = "/budgets";
/// The route to access a single budget.
pub const BUDGET: &str = "/budgets/{budget_id}";
/// The route to create import jobs.
pub const IMPORT_JOBS: &str = "/import/jobs";
/// The route to access a single import job by its key.
pub const IMPORT_JOB: &str = "/import/jobs/{key}";
/// The route to read and submit the current configuration step of an import job.
pub const IMPORT_JOB_CONFIGURATION: &str = "/import/jobs/{key}/configuration";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/budgets/{budget_id}', '{budget_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
