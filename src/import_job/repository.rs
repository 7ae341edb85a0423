//! User-scoped access to import jobs.

use rusqlite::Connection;
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    import_job::{ImportJob, ImportStage, ImportStatus, core::parse_configuration},
};

/// Reads and writes the mutable parts of import jobs on behalf of one user.
pub trait ImportJobRepository {
    /// Get the stored configuration of `job`.
    fn get_configuration(&self, job: &ImportJob) -> Result<Map<String, Value>, Error>;

    /// Replace the configuration of `job` in one write.
    fn set_configuration(&self, job: &ImportJob, configuration: Map<String, Value>) -> Result<(), Error>;

    /// Move `job` to `stage`.
    fn set_stage(&self, job: &ImportJob, stage: ImportStage) -> Result<(), Error>;

    /// Set the status of `job`.
    fn set_status(&self, job: &ImportJob, status: ImportStatus) -> Result<(), Error>;
}

/// [ImportJobRepository] backed by the application database.
#[derive(Debug, Clone, Copy)]
pub struct SqliteImportJobs<'a> {
    connection: &'a Connection,
    user_id: UserID,
}

impl<'a> SqliteImportJobs<'a> {
    /// Access the import jobs of `user_id`.
    pub fn new(connection: &'a Connection, user_id: UserID) -> Self {
        Self {
            connection,
            user_id,
        }
    }

    fn update_column(&self, job: &ImportJob, column: &str, value: &str) -> Result<(), Error> {
        let rows_affected = self.connection.execute(
            &format!(
                "UPDATE import_job SET {column} = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4"
            ),
            (
                value,
                OffsetDateTime::now_utc(),
                job.id,
                self.user_id.as_i64(),
            ),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

impl ImportJobRepository for SqliteImportJobs<'_> {
    fn get_configuration(&self, job: &ImportJob) -> Result<Map<String, Value>, Error> {
        let configuration: String = self.connection.query_row(
            "SELECT configuration FROM import_job WHERE id = ?1 AND user_id = ?2",
            (job.id, self.user_id.as_i64()),
            |row| row.get(0),
        )?;

        parse_configuration(&configuration)
    }

    fn set_configuration(&self, job: &ImportJob, configuration: Map<String, Value>) -> Result<(), Error> {
        let configuration = serde_json::to_string(&configuration)?;
        self.update_column(job, "configuration", &configuration)
    }

    fn set_stage(&self, job: &ImportJob, stage: ImportStage) -> Result<(), Error> {
        tracing::debug!("Moving import job {} to stage {stage}.", job.key);
        self.update_column(job, "stage", stage.as_str())
    }

    fn set_status(&self, job: &ImportJob, status: ImportStatus) -> Result<(), Error> {
        tracing::debug!("Setting status of import job {} to {status}.", job.key);
        self.update_column(job, "status", status.as_str())
    }
}
