//! Defines the app level error type and its conversion to JSON:API error documents.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::json_api::error_response;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not carry a bearer token, or the token does not belong
    /// to a registered user.
    #[error("missing or invalid access token")]
    Unauthorized,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    /// Resources owned by other users are also reported as not found so that
    /// a client cannot learn whether they exist.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The request payload or query parameters failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A date string could not be parsed as `YYYY-MM-DD`.
    #[error("invalid date \"{0}\", expected the format YYYY-MM-DD")]
    InvalidDate(String),

    /// The client asked to include a relation the resource does not offer.
    #[error("\"{0}\" cannot be included with this resource")]
    InvalidInclude(String),

    /// An account used in a transaction does not belong to the user or has
    /// the wrong type for the transaction type.
    #[error("invalid account: {0}")]
    InvalidAccount(String),

    /// A query was given a foreign key that does not refer to an existing row.
    #[error("a referenced resource does not exist")]
    InvalidReference,

    /// The user already has a budget with this name.
    #[error("the budget \"{0}\" already exists")]
    DuplicateBudgetName(String),

    /// A user with this email address already exists.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// Could not generate a unique key for a new import job.
    #[error("could not generate a unique import job key")]
    DuplicateImportJobKey,

    /// The import provider name is not supported.
    #[error("unknown import provider \"{0}\"")]
    UnknownProvider(String),

    /// The import job is in a stage that has no configuration step.
    #[error("import jobs in the stage \"{0}\" cannot be configured")]
    InvalidJobStage(String),

    /// The provider accounts have not been fetched for the import job, so
    /// they cannot be mapped to local accounts.
    #[error("no provider accounts found, the import cannot continue")]
    NoProviderAccounts,

    /// A stored import job configuration does not have the expected shape.
    #[error("the import job configuration is malformed: {0}")]
    InvalidConfiguration(String),

    /// Neither the user's preferred currency nor the fallback currency exist.
    #[error("could not find a default currency")]
    MissingDefaultCurrency,

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a journal that does not exist
    #[error("tried to update a transaction journal that is not in the database")]
    UpdateMissingJournal,

    /// Tried to delete a journal that does not exist
    #[error("tried to delete a transaction journal that is not in the database")]
    DeleteMissingJournal,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("import_job.key") =>
            {
                Error::DuplicateImportJobKey
            }
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::InvalidReference
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONSerializationError(value.to_string())
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::NotFound | Error::UpdateMissingJournal | Error::DeleteMissingJournal => {
                StatusCode::NOT_FOUND
            }
            Error::InvalidRequest(_)
            | Error::InvalidDate(_)
            | Error::InvalidInclude(_)
            | Error::InvalidAccount(_)
            | Error::InvalidReference
            | Error::UnknownProvider(_) => StatusCode::BAD_REQUEST,
            Error::DuplicateBudgetName(_) | Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::InvalidJobStage(_) | Error::NoProviderAccounts => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Error::Unauthorized => "Unauthenticated",
            Error::NotFound | Error::UpdateMissingJournal | Error::DeleteMissingJournal => {
                "Resource not found"
            }
            Error::InvalidRequest(_)
            | Error::InvalidDate(_)
            | Error::InvalidInclude(_)
            | Error::InvalidAccount(_)
            | Error::InvalidReference
            | Error::UnknownProvider(_) => "Invalid request",
            Error::DuplicateBudgetName(_) | Error::DuplicateEmail => "Duplicate resource",
            Error::InvalidJobStage(_) | Error::NoProviderAccounts => {
                "Import job cannot be configured"
            }
            _ => "Something went wrong",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        // Errors that are not caused by the client are not intended to be shown to the client.
        let detail = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            tracing::debug!("Rejecting request: {}", self);
            self.to_string()
        };

        error_response(status_code, self.title(), &detail)
    }
}
