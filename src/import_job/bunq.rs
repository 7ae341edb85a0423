//! The account mapping step of a bunq import.
//!
//! The provider accounts are stored in the job configuration under `accounts`
//! before this step runs. The user then picks a local asset account for each
//! of them, which is stored under `mapping` as provider ID to local ID. A local
//! ID of 0 means no account was picked.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{
    Error,
    account::{Account, AccountRepository, AccountType},
    currency::CurrencyRepository,
    database_id::AccountId,
    import_job::{ImportJob, ImportJobRepository, ImportStage, JobConfigurator},
};

/// The warning returned when the user submits no account mapping at all.
pub const NO_ACCOUNTS_SELECTED: &str = "It seems you have not selected any accounts.";

/// The account meta field holding the account's currency ID.
const CURRENCY_META_FIELD: &str = "currency_id";

/// The job configuration as read and written by this step.
///
/// Keys this step does not know about are kept as they are.
#[derive(Debug, Default, Deserialize, Serialize)]
struct BunqConfiguration {
    #[serde(default)]
    accounts: Vec<RemoteAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mapping: Option<BTreeMap<i64, AccountId>>,
    #[serde(flatten)]
    other: Map<String, Value>,
}

/// An account at bunq, as stored when the provider was queried.
#[derive(Debug, Deserialize, Serialize)]
struct RemoteAccount {
    id: i64,
    #[serde(flatten)]
    other: Map<String, Value>,
}

impl BunqConfiguration {
    fn from_map(configuration: Map<String, Value>) -> Result<Self, Error> {
        serde_json::from_value(Value::Object(configuration))
            .map_err(|error| Error::InvalidConfiguration(error.to_string()))
    }

    fn into_map(self) -> Result<Map<String, Value>, Error> {
        match serde_json::to_value(self)? {
            Value::Object(configuration) => Ok(configuration),
            other => Err(Error::InvalidConfiguration(format!(
                "expected an object, got {other}"
            ))),
        }
    }
}

/// Maps bunq accounts to the user's local asset accounts.
///
/// The repositories must all be scoped to the owner of the job.
pub struct ChooseAccountsHandler<'a, J, A, C> {
    job: &'a ImportJob,
    jobs: J,
    accounts: A,
    currencies: C,
}

impl<'a, J, A, C> ChooseAccountsHandler<'a, J, A, C>
where
    J: ImportJobRepository,
    A: AccountRepository,
    C: CurrencyRepository,
{
    /// Create a handler for `job`.
    pub fn new(job: &'a ImportJob, jobs: J, accounts: A, currencies: C) -> Self {
        Self {
            job,
            jobs,
            accounts,
            currencies,
        }
    }

    /// Resolve the local account submitted for a provider account, 0 when
    /// nothing valid was picked.
    fn resolve_local_account(&self, submitted: Option<&Value>) -> Result<AccountId, Error> {
        let local_id = match submitted {
            Some(Value::String(text)) => text.trim().parse::<AccountId>().ok(),
            Some(Value::Number(number)) => number.as_i64(),
            _ => None,
        };

        match local_id.filter(|&id| id > 0) {
            Some(id) => Ok(self.accounts.find(id)?.map_or(0, |account| account.id)),
            None => Ok(0),
        }
    }

    fn currency_code(&self, account: &Account) -> Result<String, Error> {
        let currency_id = match self.accounts.get_meta_value(account, CURRENCY_META_FIELD)? {
            Some(Value::String(text)) => text.trim().parse::<i64>().ok(),
            Some(Value::Number(number)) => number.as_i64(),
            _ => None,
        };

        let currency = match currency_id {
            Some(id) => self.currencies.find(id)?,
            None => None,
        };

        match currency {
            Some(currency) => Ok(currency.code),
            None => Ok(self.currencies.default_currency()?.code),
        }
    }
}

impl<J, A, C> JobConfigurator for ChooseAccountsHandler<'_, J, A, C>
where
    J: ImportJobRepository,
    A: AccountRepository,
    C: CurrencyRepository,
{
    fn configuration_complete(&self) -> Result<bool, Error> {
        let configuration = self.jobs.get_configuration(self.job)?;

        let has_mapping = match configuration.get("mapping") {
            Some(Value::Object(mapping)) => !mapping.is_empty(),
            Some(Value::Array(mapping)) => !mapping.is_empty(),
            _ => false,
        };

        if has_mapping {
            self.jobs.set_stage(self.job, ImportStage::GoForImport)?;
        }

        Ok(has_mapping)
    }

    fn configure_job(&self, data: &Map<String, Value>) -> Result<Vec<String>, Error> {
        let mut configuration = BunqConfiguration::from_map(self.jobs.get_configuration(self.job)?)?;

        if configuration.accounts.is_empty() {
            return Err(Error::NoProviderAccounts);
        }

        let submitted = match data.get("account_mapping") {
            Some(Value::Object(submitted)) => submitted.clone(),
            _ => Map::new(),
        };

        if submitted.is_empty() {
            tracing::debug!("No accounts selected for import job {}.", self.job.key);
            return Ok(vec![NO_ACCOUNTS_SELECTED.to_owned()]);
        }

        let mut mapping = BTreeMap::new();
        for remote in &configuration.accounts {
            let local_id = self.resolve_local_account(submitted.get(&remote.id.to_string()))?;
            mapping.insert(remote.id, local_id);
        }

        tracing::debug!(
            "Mapped bunq accounts for import job {}: {mapping:?}",
            self.job.key
        );

        configuration.mapping = Some(mapping);
        self.jobs
            .set_configuration(self.job, configuration.into_map()?)?;

        Ok(Vec::new())
    }

    fn get_next_data(&self) -> Result<Value, Error> {
        let configuration = self.jobs.get_configuration(self.job)?;
        let remote_accounts = configuration
            .get("accounts")
            .cloned()
            .unwrap_or_else(|| json!([]));

        let mut local_accounts = Map::new();
        for account in self.accounts.get_accounts_by_type(&[AccountType::Asset])? {
            local_accounts.insert(
                account.id.to_string(),
                json!({
                    "name": account.name,
                    "iban": account.iban,
                    "code": self.currency_code(&account)?,
                }),
            );
        }

        Ok(json!({
            "accounts": remote_accounts,
            "local_accounts": local_accounts,
        }))
    }
}
