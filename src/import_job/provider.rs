use std::{fmt::Display, str::FromStr};

use rusqlite::Connection;
use serde_json::{Map, Value};

use crate::{
    Error,
    account::SqliteAccounts,
    currency::SqliteCurrencies,
    import_job::{ImportJob, ImportStage, SqliteImportJobs, bunq::ChooseAccountsHandler},
};

/// An external source of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// The bunq bank.
    Bunq,
}

impl Provider {
    /// The name stored in the database and sent by clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Bunq => "bunq",
        }
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bunq" => Ok(Provider::Bunq),
            other => Err(Error::UnknownProvider(other.to_owned())),
        }
    }
}

/// One configuration step of an import job.
pub trait JobConfigurator {
    /// Whether the step has everything it needs. Moves the job to its next
    /// stage when it does.
    fn configuration_complete(&self) -> Result<bool, Error>;

    /// Apply the data the user submitted for this step.
    ///
    /// Returns warnings for the user, an empty list means the data was accepted.
    fn configure_job(&self, data: &Map<String, Value>) -> Result<Vec<String>, Error>;

    /// The data a client needs to show this step to the user.
    fn get_next_data(&self) -> Result<Value, Error>;
}

/// Pick the configuration step for `job` based on its provider and stage.
///
/// # Errors
/// Returns [Error::InvalidJobStage] if the job's stage has no configuration step.
pub fn configurator_for<'a>(
    job: &'a ImportJob,
    connection: &'a Connection,
) -> Result<Box<dyn JobConfigurator + 'a>, Error> {
    match (job.provider, job.stage) {
        (Provider::Bunq, ImportStage::New | ImportStage::ChooseAccounts) => {
            Ok(Box::new(ChooseAccountsHandler::new(
                job,
                SqliteImportJobs::new(connection, job.user_id),
                SqliteAccounts::new(connection, job.user_id),
                SqliteCurrencies::new(connection, job.user_id),
            )))
        }
        (_, stage) => Err(Error::InvalidJobStage(stage.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        import_job::{
            ImportJobRepository, ImportStage, Provider, SqliteImportJobs, configurator_for,
            create_import_job, get_import_job_by_key,
        },
        test_utils::{get_test_connection, insert_test_user},
    };

    #[test]
    fn unknown_provider_is_rejected() {
        assert_eq!(
            "spectre".parse::<Provider>(),
            Err(Error::UnknownProvider("spectre".to_owned()))
        );
    }

    #[test]
    fn new_job_gets_a_configurator() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let job = create_import_job(user.id, Provider::Bunq, &conn).unwrap();

        let configurator = configurator_for(&job, &conn).unwrap();

        assert_eq!(configurator.configuration_complete(), Ok(false));
    }

    #[test]
    fn job_ready_for_import_cannot_be_configured() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let job = create_import_job(user.id, Provider::Bunq, &conn).unwrap();
        SqliteImportJobs::new(&conn, user.id)
            .set_stage(&job, ImportStage::GoForImport)
            .unwrap();
        let job = get_import_job_by_key(user.id, &job.key, &conn).unwrap();

        let result = configurator_for(&job, &conn).map(|_| ());

        assert_eq!(
            result,
            Err(Error::InvalidJobStage("go-for-import".to_owned()))
        );
    }
}
