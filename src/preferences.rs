//! Per-user preferences stored as JSON values.
//!
//! Preferences are looked up by name. A missing preference is not an error,
//! callers decide on the fallback value.

use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{Error, UserID};

/// The number of items the user wants on each page of a list.
pub const LIST_PAGE_SIZE: &str = "listPageSize";

/// The currency code the user wants amounts in by default, e.g. "EUR".
pub const CURRENCY_PREFERENCE: &str = "currencyPreference";

/// Create the preference table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_preference_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS preference (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            data TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Get the value of the preference `name` for a user, or `None` if it was never set.
///
/// # Errors
/// Returns an error if the stored value is not valid JSON or if there is an SQL error.
pub fn get_preference(
    user_id: UserID,
    name: &str,
    connection: &Connection,
) -> Result<Option<Value>, Error> {
    let raw: Option<String> = connection
        .prepare("SELECT data FROM preference WHERE user_id = ?1 AND name = ?2")?
        .query_row((user_id.as_i64(), name), |row| row.get(0))
        .optional()?;

    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Set the preference `name` for a user, replacing any previous value.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn set_preference(
    user_id: UserID,
    name: &str,
    value: &Value,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO preference (user_id, name, data, updated_at) VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(user_id, name) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        (
            user_id.as_i64(),
            name,
            serde_json::to_string(value)?,
            OffsetDateTime::now_utc(),
        ),
    )?;

    Ok(())
}

/// Get the number of items per page the user wants in lists.
///
/// Falls back to `default_page_size` when the preference is missing, not a
/// positive integer or larger than SQLite can use as a limit.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn get_list_page_size(
    user_id: UserID,
    default_page_size: u64,
    connection: &Connection,
) -> Result<u64, Error> {
    let page_size = get_preference(user_id, LIST_PAGE_SIZE, connection)?
        .and_then(|value| match value {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.parse().ok(),
            _ => None,
        })
        .filter(|&page_size| page_size > 0 && i64::try_from(page_size).is_ok());

    Ok(page_size.unwrap_or(default_page_size))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        preferences::{
            CURRENCY_PREFERENCE, LIST_PAGE_SIZE, get_list_page_size, get_preference,
            set_preference,
        },
        test_utils::{get_test_connection, insert_test_user},
    };

    #[test]
    fn missing_preference_is_none() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);

        let value = get_preference(user.id, CURRENCY_PREFERENCE, &conn).unwrap();

        assert_eq!(value, None);
    }

    #[test]
    fn set_replaces_previous_value() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);

        set_preference(user.id, CURRENCY_PREFERENCE, &json!("EUR"), &conn).unwrap();
        set_preference(user.id, CURRENCY_PREFERENCE, &json!("NZD"), &conn).unwrap();

        assert_eq!(
            get_preference(user.id, CURRENCY_PREFERENCE, &conn).unwrap(),
            Some(json!("NZD"))
        );
    }

    #[test]
    fn page_size_falls_back_to_default() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);

        assert_eq!(get_list_page_size(user.id, 50, &conn).unwrap(), 50);

        set_preference(user.id, LIST_PAGE_SIZE, &json!(0), &conn).unwrap();
        assert_eq!(get_list_page_size(user.id, 50, &conn).unwrap(), 50);

        set_preference(user.id, LIST_PAGE_SIZE, &json!(u64::MAX), &conn).unwrap();
        assert_eq!(get_list_page_size(user.id, 50, &conn).unwrap(), 50);
    }

    #[test]
    fn page_size_reads_preference() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);

        set_preference(user.id, LIST_PAGE_SIZE, &json!(20), &conn).unwrap();

        assert_eq!(get_list_page_size(user.id, 50, &conn).unwrap(), 20);
    }
}
