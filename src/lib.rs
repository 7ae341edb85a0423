//! Ledgerline is the backend of a personal finance manager.
//!
//! This library provides a JSON:API over a user's transactions, budgets and
//! import jobs. Every request is scoped to the user identified by the bearer
//! token sent with it.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod account;
mod app_state;
mod attachment;
mod auth;
mod budget;
mod category;
mod currency;
mod database_id;
mod db;
mod endpoints;
mod error;
mod event;
mod import_job;
mod json_api;
mod logging;
mod pagination;
mod piggy_bank;
mod preferences;
mod routing;
mod transaction;
mod transformer;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::hash_token;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use event::{EventBus, JournalEvent};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use user::{User, UserID, create_user, get_user_by_email, update_token_hash};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
