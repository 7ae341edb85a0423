use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::{Error, UserID, database_id::DatabaseId, db::parse_column, import_job::Provider};

/// How many times to retry generating a unique job key.
const KEY_ATTEMPTS: usize = 3;
/// The number of hex characters in a job key.
const KEY_LENGTH: usize = 12;

/// The configuration step an import job is at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportStage {
    /// The job was just created.
    New,
    /// The user is mapping provider accounts to local accounts.
    ChooseAccounts,
    /// Configuration is done and the import may run.
    GoForImport,
    /// The job failed.
    Error,
}

impl ImportStage {
    /// The name stored in the database and shown to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStage::New => "new",
            ImportStage::ChooseAccounts => "choose-accounts",
            ImportStage::GoForImport => "go-for-import",
            ImportStage::Error => "error",
        }
    }
}

impl Display for ImportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportStage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ImportStage::New),
            "choose-accounts" => Ok(ImportStage::ChooseAccounts),
            "go-for-import" => Ok(ImportStage::GoForImport),
            "error" => Ok(ImportStage::Error),
            other => Err(Error::InvalidJobStage(other.to_owned())),
        }
    }
}

/// Whether an import job is being configured or can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportStatus {
    /// The job was just created.
    New,
    /// The user is still configuring the job.
    Configuring,
    /// The job is configured and waiting to run.
    ReadyToRun,
    /// The job failed.
    Error,
}

impl ImportStatus {
    /// The name stored in the database and shown to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::New => "new",
            ImportStatus::Configuring => "configuring",
            ImportStatus::ReadyToRun => "ready_to_run",
            ImportStatus::Error => "error",
        }
    }
}

impl Display for ImportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ImportStatus::New),
            "configuring" => Ok(ImportStatus::Configuring),
            "ready_to_run" => Ok(ImportStatus::ReadyToRun),
            "error" => Ok(ImportStatus::Error),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown import status \"{other}\""
            ))),
        }
    }
}

/// An import of transactions from an external provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportJob {
    /// The ID of the job.
    pub id: DatabaseId,
    /// The user that owns the job.
    pub user_id: UserID,
    /// The public identifier of the job.
    pub key: String,
    /// Where the transactions come from.
    pub provider: Provider,
    /// The configuration step the job is at.
    pub stage: ImportStage,
    /// Whether the job is being configured or can run.
    pub status: ImportStatus,
    /// Provider specific settings.
    pub configuration: Map<String, Value>,
    /// When the job was created.
    pub created_at: OffsetDateTime,
    /// When the job was last changed.
    pub updated_at: OffsetDateTime,
}

/// Create the import job table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_import_job_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS import_job (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            key TEXT NOT NULL UNIQUE,
            provider TEXT NOT NULL,
            stage TEXT NOT NULL,
            status TEXT NOT NULL,
            configuration TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Create a new import job for `user_id` with an empty configuration.
///
/// # Errors
/// Returns:
/// - [Error::DuplicateImportJobKey] if no unique key could be generated,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_import_job(
    user_id: UserID,
    provider: Provider,
    connection: &Connection,
) -> Result<ImportJob, Error> {
    let now = OffsetDateTime::now_utc();

    for attempt in 0..KEY_ATTEMPTS {
        let key = generate_key(user_id, now, attempt);

        let result = connection.execute(
            "INSERT INTO import_job (user_id, key, provider, stage, status, configuration, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, '{}', ?6, ?6)",
            (
                user_id.as_i64(),
                &key,
                provider.as_str(),
                ImportStage::New.as_str(),
                ImportStatus::New.as_str(),
                now,
            ),
        );

        match result.map_err(Error::from) {
            Ok(_) => {
                return Ok(ImportJob {
                    id: connection.last_insert_rowid(),
                    user_id,
                    key,
                    provider,
                    stage: ImportStage::New,
                    status: ImportStatus::New,
                    configuration: Map::new(),
                    created_at: now,
                    updated_at: now,
                });
            }
            Err(Error::DuplicateImportJobKey) => {
                tracing::warn!("Import job key {key} is taken, trying another one.");
            }
            Err(error) => return Err(error),
        }
    }

    Err(Error::DuplicateImportJobKey)
}

/// Get the user's import job with `key`.
///
/// # Errors
/// Returns [Error::NotFound] if the user has no job with that key, or an error
/// if there is an SQL error.
pub fn get_import_job_by_key(
    user_id: UserID,
    key: &str,
    connection: &Connection,
) -> Result<ImportJob, Error> {
    connection
        .prepare(
            "SELECT id, user_id, key, provider, stage, status, configuration, created_at, updated_at
            FROM import_job WHERE key = ?1 AND user_id = ?2",
        )?
        .query_row((key, user_id.as_i64()), map_row)
        .map_err(|error| error.into())
}

fn generate_key(user_id: UserID, now: OffsetDateTime, attempt: usize) -> String {
    let seed = format!("{user_id}:{}:{attempt}", now.unix_timestamp_nanos());
    let digest = format!("{:x}", Sha256::digest(seed.as_bytes()));

    digest[..KEY_LENGTH].to_owned()
}

pub(crate) fn parse_configuration(text: &str) -> Result<Map<String, Value>, Error> {
    match serde_json::from_str(text)? {
        Value::Object(configuration) => Ok(configuration),
        Value::Null => Ok(Map::new()),
        other => Err(Error::InvalidConfiguration(format!(
            "expected an object, got {other}"
        ))),
    }
}

fn map_row(row: &Row) -> Result<ImportJob, rusqlite::Error> {
    let configuration: String = row.get(6)?;
    let configuration = parse_configuration(&configuration).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(ImportJob {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        key: row.get(2)?,
        provider: parse_column(row, 3)?,
        stage: parse_column(row, 4)?,
        status: parse_column(row, 5)?,
        configuration,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
