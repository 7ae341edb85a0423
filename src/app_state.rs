//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error, db::initialize, endpoints::API_PREFIX, event::EventBus, json_api::JsonApiSerializer,
    pagination::PaginationConfig,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The config that controls how to split lists of resources into pages.
    pub pagination_config: PaginationConfig,

    /// The public URL of the server, e.g. "https://example.com", used to build
    /// absolute links in responses.
    pub base_url: String,

    /// Where transaction journal events are published.
    pub events: EventBus,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        base_url: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            pagination_config,
            base_url: base_url.trim_end_matches('/').to_owned(),
            events: EventBus::default(),
        })
    }

    /// A serializer that links resources under the API prefix of [AppState::base_url].
    pub fn serializer(&self) -> JsonApiSerializer {
        JsonApiSerializer::new(&format!("{}{}", self.base_url, API_PREFIX))
    }
}
