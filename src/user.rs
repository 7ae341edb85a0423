//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash, PartialOrd, Ord)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email address.
    pub email: EmailAddress,
    /// When the user was registered.
    pub created_at: OffsetDateTime,
    /// When the user was last changed.
    pub updated_at: OffsetDateTime,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                token_hash TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// `token_hash` is the hash of the user's access token, see [crate::hash_token].
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if the email address is already registered,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    email: &EmailAddress,
    token_hash: &str,
    connection: &Connection,
) -> Result<User, Error> {
    let now = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO user (email, token_hash, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        (email.as_str(), token_hash, now),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email: email.clone(),
        created_at: now,
        updated_at: now,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, created_at, updated_at FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has that email address.
pub fn get_user_by_email(email: &EmailAddress, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, created_at, updated_at FROM user WHERE email = :email")?
        .query_row(&[(":email", email.as_str())], map_user_row)
        .map_err(|error| error.into())
}

/// Find the user whose access token hashes to `token_hash`.
///
/// # Errors
///
/// Returns [Error::SqlError] if the query failed.
pub fn find_user_by_token_hash(
    token_hash: &str,
    connection: &Connection,
) -> Result<Option<User>, Error> {
    connection
        .prepare("SELECT id, email, created_at, updated_at FROM user WHERE token_hash = :hash")?
        .query_row(&[(":hash", token_hash)], map_user_row)
        .optional()
        .map_err(|error| error.into())
}

/// Replace the access token hash of a user.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered user.
pub fn update_token_hash(
    user_id: UserID,
    token_hash: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET token_hash = ?1, updated_at = ?2 WHERE id = ?3",
        (token_hash, OffsetDateTime::now_utc(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_email: String = row.get(1)?;
    let email = EmailAddress::new_unchecked(raw_email);

    Ok(User {
        id: UserID::new(row.get(0)?),
        email,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use email_address::EmailAddress;
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        user::{
            create_user, find_user_by_token_hash, get_user_by_email, get_user_by_id,
            update_token_hash,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_and_get_user() {
        let conn = get_test_connection();
        let email = EmailAddress::from_str("test@example.com").unwrap();

        let user = create_user(&email, "hash", &conn).unwrap();

        assert_eq!(get_user_by_id(user.id, &conn).unwrap().email, email);
        assert_eq!(get_user_by_email(&email, &conn).unwrap().id, user.id);
    }

    #[test]
    fn create_fails_on_duplicate_email() {
        let conn = get_test_connection();
        let email = EmailAddress::from_str("test@example.com").unwrap();
        create_user(&email, "hash", &conn).unwrap();

        let result = create_user(&email, "other hash", &conn);

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn find_by_token_hash() {
        let conn = get_test_connection();
        let email = EmailAddress::from_str("test@example.com").unwrap();
        let user = create_user(&email, "hash", &conn).unwrap();

        assert_eq!(
            find_user_by_token_hash("hash", &conn).unwrap().map(|u| u.id),
            Some(user.id)
        );
        assert_eq!(find_user_by_token_hash("nope", &conn).unwrap(), None);
    }

    #[test]
    fn update_token_replaces_old_hash() {
        let conn = get_test_connection();
        let email = EmailAddress::from_str("test@example.com").unwrap();
        let user = create_user(&email, "old", &conn).unwrap();

        update_token_hash(user.id, "new", &conn).unwrap();

        assert_eq!(find_user_by_token_hash("old", &conn).unwrap(), None);
        assert!(find_user_by_token_hash("new", &conn).unwrap().is_some());
    }
}
