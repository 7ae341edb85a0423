//! Categories that transaction journals can be filed under.

use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;

use crate::{Error, UserID, database_id::CategoryId};

/// A user-defined grouping of journals, e.g. "Rent".
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The user that owns the category.
    pub user_id: UserID,
    /// The name of the category, unique per user.
    pub name: String,
    /// When the category was created.
    pub created_at: OffsetDateTime,
    /// When the category was last changed.
    pub updated_at: OffsetDateTime,
}

/// Create the category table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Get the user's category with `id`.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn find_category(
    user_id: UserID,
    id: CategoryId,
    connection: &Connection,
) -> Result<Option<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, created_at, updated_at FROM category
            WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_row)
        .optional()
        .map_err(|error| error.into())
}

/// Resolve the category for a journal.
///
/// An `id` that belongs to the user wins. Otherwise a non-blank `name` is
/// looked up and created if the user has no category by that name yet.
/// Returns `None` when neither resolves.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn find_or_create_category(
    user_id: UserID,
    id: Option<CategoryId>,
    name: Option<&str>,
    connection: &Connection,
) -> Result<Option<Category>, Error> {
    if let Some(id) = id.filter(|&id| id > 0)
        && let Some(category) = find_category(user_id, id, connection)?
    {
        return Ok(Some(category));
    }

    let Some(name) = name.map(str::trim).filter(|name| !name.is_empty()) else {
        return Ok(None);
    };

    let existing = connection
        .prepare(
            "SELECT id, user_id, name, created_at, updated_at FROM category
            WHERE user_id = ?1 AND name = ?2",
        )?
        .query_row((user_id.as_i64(), name), map_row)
        .optional()?;

    if existing.is_some() {
        return Ok(existing);
    }

    let now = OffsetDateTime::now_utc();
    connection.execute(
        "INSERT INTO category (user_id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        (user_id.as_i64(), name, now),
    )?;
    tracing::debug!("Created category \"{name}\" for user {user_id}.");

    Ok(Some(Category {
        id: connection.last_insert_rowid(),
        user_id,
        name: name.to_owned(),
        created_at: now,
        updated_at: now,
    }))
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}
