//! Files attached to transaction journals.
//!
//! Only the attachment records are kept here, file contents live elsewhere.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    database_id::{DatabaseId, JournalId},
};

/// A file attached to a journal.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    /// The ID of the attachment.
    pub id: DatabaseId,
    /// The user that owns the attachment.
    pub user_id: UserID,
    /// The journal the file is attached to.
    pub journal_id: JournalId,
    /// The original file name.
    pub filename: String,
    /// A display title.
    pub title: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// The media type of the file, e.g. "application/pdf".
    pub mime: String,
    /// The file size in bytes.
    pub size: i64,
    /// When the attachment was created.
    pub created_at: OffsetDateTime,
    /// When the attachment was last changed.
    pub updated_at: OffsetDateTime,
}

/// The data needed to record an attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttachment {
    /// The original file name.
    pub filename: String,
    /// A display title.
    pub title: Option<String>,
    /// The media type of the file.
    pub mime: String,
    /// The file size in bytes.
    pub size: i64,
}

/// Create the attachment table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_attachment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS attachment (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            journal_id INTEGER NOT NULL,
            filename TEXT NOT NULL,
            title TEXT,
            notes TEXT,
            mime TEXT NOT NULL,
            size INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(journal_id) REFERENCES transaction_journal(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Record an attachment on one of the user's journals.
///
/// # Errors
/// Returns [Error::InvalidReference] if the journal does not exist, or an
/// error if there is an SQL error.
pub fn create_attachment(
    user_id: UserID,
    journal_id: JournalId,
    attachment: NewAttachment,
    connection: &Connection,
) -> Result<Attachment, Error> {
    let now = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO attachment (user_id, journal_id, filename, title, mime, size, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        (
            user_id.as_i64(),
            journal_id,
            &attachment.filename,
            &attachment.title,
            &attachment.mime,
            attachment.size,
            now,
        ),
    )?;

    Ok(Attachment {
        id: connection.last_insert_rowid(),
        user_id,
        journal_id,
        filename: attachment.filename,
        title: attachment.title,
        notes: None,
        mime: attachment.mime,
        size: attachment.size,
        created_at: now,
        updated_at: now,
    })
}

/// Get the user's attachments on a journal, oldest first.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn get_journal_attachments(
    user_id: UserID,
    journal_id: JournalId,
    connection: &Connection,
) -> Result<Vec<Attachment>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, journal_id, filename, title, notes, mime, size, created_at, updated_at
            FROM attachment WHERE user_id = ?1 AND journal_id = ?2 ORDER BY id ASC",
        )?
        .query_map((user_id.as_i64(), journal_id), map_row)?
        .map(|maybe_attachment| maybe_attachment.map_err(|error| error.into()))
        .collect()
}

fn map_row(row: &Row) -> Result<Attachment, rusqlite::Error> {
    Ok(Attachment {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        journal_id: row.get(2)?,
        filename: row.get(3)?,
        title: row.get(4)?,
        notes: row.get(5)?,
        mime: row.get(6)?,
        size: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
