use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    Error, UserID,
    database_id::TransactionId,
    transaction::{destroy_journal, find_journal_by_transaction, render::TransactionState},
};

/// Delete the journal that owns `transaction_id`, both legs included.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let journal = find_journal_by_transaction(user_id, transaction_id, &connection)?;
    destroy_journal(user_id, &journal, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{
            TEST_TOKEN, get_test_connection, get_test_server, insert_test_user, insert_user,
            seed_withdrawal,
        },
        transaction::{find_journal, get_journal_transactions},
    };

    fn transaction_url(transaction_id: i64) -> String {
        format!(
            "{}{}",
            endpoints::API_PREFIX,
            format_endpoint(endpoints::TRANSACTION, transaction_id)
        )
    }

    #[tokio::test]
    async fn deletes_journal_and_legs() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let journal = seed_withdrawal(&conn, user.id, 12.5);
        let legs = get_journal_transactions(journal.id, &conn).unwrap();
        let (server, state) = get_test_server(conn);

        let response = server
            .delete(&transaction_url(legs[0].id))
            .authorization_bearer(TEST_TOKEN)
            .await;

        response.assert_status(StatusCode::NO_CONTENT);
        response.assert_text("");
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(find_journal(user.id, journal.id, &connection).unwrap(), None);
        assert_eq!(get_journal_transactions(journal.id, &connection).unwrap(), vec![]);
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let journal = seed_withdrawal(&conn, user.id, 12.5);
        let legs = get_journal_transactions(journal.id, &conn).unwrap();
        let (server, _) = get_test_server(conn);

        server
            .delete(&transaction_url(legs[1].id))
            .authorization_bearer(TEST_TOKEN)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        let response = server
            .delete(&transaction_url(legs[1].id))
            .authorization_bearer(TEST_TOKEN)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn other_users_transaction_is_kept() {
        let conn = get_test_connection();
        insert_test_user(&conn);
        let other = insert_user(&conn, "other@example.com", "other-token");
        let journal = seed_withdrawal(&conn, other.id, 12.5);
        let legs = get_journal_transactions(journal.id, &conn).unwrap();
        let (server, state) = get_test_server(conn);

        let response = server
            .delete(&transaction_url(legs[0].id))
            .authorization_bearer(TEST_TOKEN)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let connection = state.db_connection.lock().unwrap();
        assert!(find_journal(other.id, journal.id, &connection).unwrap().is_some());
    }
}
