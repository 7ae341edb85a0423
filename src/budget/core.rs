use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;

use crate::{Error, UserID, database_id::BudgetId};

/// A spending plan that withdrawals are assigned to.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The user that owns the budget.
    pub user_id: UserID,
    /// The name of the budget, unique per user.
    pub name: String,
    /// Whether the budget is in use.
    pub active: bool,
    /// When the budget was created.
    pub created_at: OffsetDateTime,
    /// When the budget was last changed.
    pub updated_at: OffsetDateTime,
}

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Create a budget named `name` for `user_id`.
///
/// # Errors
/// Returns:
/// - [Error::InvalidRequest] if `name` is blank,
/// - [Error::DuplicateBudgetName] if the user already has a budget called `name`,
/// - or [Error::SqlError] if some other SQL error occurred.
pub fn create_budget(user_id: UserID, name: &str, connection: &Connection) -> Result<Budget, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::InvalidRequest("a budget needs a name".to_owned()));
    }

    if find_budget_by_name(user_id, name, connection)?.is_some() {
        return Err(Error::DuplicateBudgetName(name.to_owned()));
    }

    let now = OffsetDateTime::now_utc();
    connection.execute(
        "INSERT INTO budget (user_id, name, active, created_at, updated_at) VALUES (?1, ?2, 1, ?3, ?3)",
        (user_id.as_i64(), name, now),
    )?;

    Ok(Budget {
        id: connection.last_insert_rowid(),
        user_id,
        name: name.to_owned(),
        active: true,
        created_at: now,
        updated_at: now,
    })
}

/// Get the user's budget with `id`.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn find_budget(
    user_id: UserID,
    id: BudgetId,
    connection: &Connection,
) -> Result<Option<Budget>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, active, created_at, updated_at FROM budget
            WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_row)
        .optional()
        .map_err(|error| error.into())
}

/// Get the user's budget called `name`.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn find_budget_by_name(
    user_id: UserID,
    name: &str,
    connection: &Connection,
) -> Result<Option<Budget>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, active, created_at, updated_at FROM budget
            WHERE name = ?1 AND user_id = ?2",
        )?
        .query_row((name, user_id.as_i64()), map_row)
        .optional()
        .map_err(|error| error.into())
}

/// Get all of the user's budgets ordered by name.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn get_all_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, active, created_at, updated_at FROM budget
            WHERE user_id = ?1 ORDER BY name ASC",
        )?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_budget| maybe_budget.map_err(|error| error.into()))
        .collect()
}

fn map_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        active: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
