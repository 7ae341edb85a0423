use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{
    AppState, Error, UserID,
    import_job::{
        ImportJobRepository, ImportStatus, Provider, SqliteImportJobs, configurator_for,
        create_import_job, get_import_job_by_key,
    },
    json_api::{ApiJson, Document, JsonApiSerializer},
    transformer::{ImportJobTransformer, Transformer},
};

/// The state needed by the import job endpoints.
#[derive(Debug, Clone)]
pub struct ImportJobState {
    /// The database connection for managing import jobs.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Builds the JSON:API documents.
    pub serializer: JsonApiSerializer,
}

impl FromRef<AppState> for ImportJobState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            serializer: state.serializer(),
        }
    }
}

/// The request body for creating an import job.
#[derive(Debug, Deserialize)]
pub struct NewImportJobRequest {
    /// The name of the provider, e.g. "bunq".
    pub provider: String,
}

/// Create an import job for the user.
pub async fn create_import_job_endpoint(
    State(state): State<ImportJobState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(request): ApiJson<NewImportJobRequest>,
) -> Result<Document, Error> {
    let provider: Provider = request.provider.trim().parse()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let job = create_import_job(user_id, provider, &connection)?;
    tracing::info!("Created {provider} import job {} for user {user_id}.", job.key);

    Ok(state
        .serializer
        .item(ImportJobTransformer.resource(&state.serializer, &job)))
}

/// Show one of the user's import jobs.
pub async fn get_import_job_endpoint(
    State(state): State<ImportJobState>,
    Extension(user_id): Extension<UserID>,
    Path(key): Path<String>,
) -> Result<Document, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let job = get_import_job_by_key(user_id, &key, &connection)?;

    Ok(state
        .serializer
        .item(ImportJobTransformer.resource(&state.serializer, &job)))
}

/// Get what a client needs to show the job's current configuration step.
///
/// The job is the primary data and the step's data is in `meta.configuration`.
pub async fn get_import_job_configuration_endpoint(
    State(state): State<ImportJobState>,
    Extension(user_id): Extension<UserID>,
    Path(key): Path<String>,
) -> Result<Document, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let job = get_import_job_by_key(user_id, &key, &connection)?;
    let next_data = configurator_for(&job, &connection)?.get_next_data()?;

    Ok(state
        .serializer
        .item(ImportJobTransformer.resource(&state.serializer, &job))
        .with_meta("configuration", next_data))
}

/// Submit the data for the job's current configuration step.
///
/// Warnings for the user are returned in `meta.messages`. When there are none
/// and the step is complete, the job moves on and is ready to run.
///
/// The job's remote account list is filled by the provider step that lists
/// the user's accounts, which this service does not run. Until the list is
/// filled, configuring a Bunq job answers 422 Unprocessable Entity.
pub async fn configure_import_job_endpoint(
    State(state): State<ImportJobState>,
    Extension(user_id): Extension<UserID>,
    Path(key): Path<String>,
    ApiJson(data): ApiJson<Map<String, Value>>,
) -> Result<Document, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let job = get_import_job_by_key(user_id, &key, &connection)?;
    let messages = {
        let configurator = configurator_for(&job, &connection)?;
        let messages = configurator.configure_job(&data)?;
        let jobs = SqliteImportJobs::new(&connection, user_id);

        if messages.is_empty() && configurator.configuration_complete()? {
            jobs.set_status(&job, ImportStatus::ReadyToRun)?;
        } else {
            jobs.set_status(&job, ImportStatus::Configuring)?;
        }

        messages
    };

    if !messages.is_empty() {
        tracing::debug!("Import job {key} needs more input: {messages:?}");
    }

    let job = get_import_job_by_key(user_id, &key, &connection)?;

    Ok(state
        .serializer
        .item(ImportJobTransformer.resource(&state.serializer, &job))
        .with_meta("messages", json!(messages)))
}
