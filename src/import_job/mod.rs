//! Import jobs pull transactions from external providers after the user has
//! configured them step by step.

pub(crate) mod bunq;
mod core;
mod endpoints;
mod provider;
mod repository;

pub use core::{
    ImportJob, ImportStage, ImportStatus, create_import_job, create_import_job_table,
    get_import_job_by_key,
};
pub use endpoints::{
    ImportJobState, configure_import_job_endpoint, create_import_job_endpoint,
    get_import_job_configuration_endpoint, get_import_job_endpoint,
};
pub use provider::{JobConfigurator, Provider, configurator_for};
pub use repository::{ImportJobRepository, SqliteImportJobs};
