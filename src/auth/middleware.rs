//! Authentication middleware that resolves bearer tokens to users.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use rusqlite::Connection;

use crate::{AppState, Error, auth::hash_token, user::find_user_by_token_hash};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token.
///
/// The user ID is placed into the request extensions and the request executed
/// normally if the token belongs to a user, otherwise a 401 error document is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, mut request: Request, next: Next) -> Response {
    let token = match request.headers().typed_get::<Authorization<Bearer>>() {
        Some(Authorization(bearer)) => bearer.token().to_owned(),
        None => {
            tracing::debug!("Request to {} has no bearer token.", request.uri());
            return Error::Unauthorized.into_response();
        }
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        find_user_by_token_hash(&hash_token(&token), &connection)
    };

    match user {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user.id);
            next.run(request).await
        }
        Ok(None) => {
            tracing::warn!("Rejected request to {} with an unknown token.", request.uri());
            Error::Unauthorized.into_response()
        }
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod auth_guard_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Router, http::StatusCode, middleware, routing::get};
    use axum_test::TestServer;
    use email_address::EmailAddress;
    use rusqlite::Connection;

    use crate::{
        UserID,
        auth::{AuthState, auth_guard, hash_token},
        db::initialize,
        user::create_user,
    };

    const TEST_PROTECTED_ROUTE: &str = "/protected";

    async fn test_handler(Extension(user_id): Extension<UserID>) -> String {
        user_id.to_string()
    }

    fn get_test_server() -> (TestServer, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            &EmailAddress::new_unchecked("test@example.com"),
            &hash_token("let-me-in"),
            &connection,
        )
        .unwrap();

        let state = AuthState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .with_state(state);

        (TestServer::try_new(app).unwrap(), user.id)
    }

    #[tokio::test]
    async fn valid_token_passes_user_id_to_handler() {
        let (server, user_id) = get_test_server();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer("let-me-in")
            .await;

        response.assert_status_ok();
        response.assert_text(user_id.to_string());
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let (server, _) = get_test_server();

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let (server, _) = get_test_server();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer("wrong")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
