use axum::{
    Extension,
    extract::{Path, Query, State},
};

use crate::{
    Error, UserID,
    attachment::get_journal_attachments,
    database_id::TransactionId,
    json_api::Document,
    piggy_bank::{find_piggy_bank, get_journal_piggy_bank_events},
    transaction::{
        find_journal_by_transaction,
        render::{IncludeParams, TransactionState, render_journal},
    },
    transformer::{
        AttachmentTransformer, Includes, PiggyBankEventTransformer, PiggyBankTransformer,
        TransactionTransformer, Transformer, UserTransformer,
    },
    user::get_user_by_id,
};

/// Show the user-facing leg of the journal that owns `transaction_id`.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Query(params): Query<IncludeParams>,
) -> Result<Document, Error> {
    let includes = Includes::resolve::<TransactionTransformer>(params.include.as_deref())?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let journal = find_journal_by_transaction(user_id, transaction_id, &connection)?;

    render_journal(&journal, &includes, user_id, &state.serializer, &connection)
}

/// List the attachments on the journal that owns `transaction_id`.
pub async fn get_transaction_attachments_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Query(params): Query<IncludeParams>,
) -> Result<Document, Error> {
    let includes = Includes::resolve::<AttachmentTransformer>(params.include.as_deref())?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let journal = find_journal_by_transaction(user_id, transaction_id, &connection)?;
    let attachments = get_journal_attachments(user_id, journal.id, &connection)?;
    let mut resources = AttachmentTransformer.resources(&state.serializer, &attachments);

    let mut included = Vec::new();
    if includes.contains("user") {
        let user = UserTransformer.resource(&state.serializer, &get_user_by_id(user_id, &connection)?);
        for resource in &mut resources {
            resource.relate_one("user", &user);
        }
        included.push(user);
    }

    let mut document = state.serializer.collection(resources);
    document.include(included);

    Ok(document)
}

/// List the piggy bank events caused by the journal that owns `transaction_id`.
pub async fn get_transaction_piggy_bank_events_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Query(params): Query<IncludeParams>,
) -> Result<Document, Error> {
    let includes = Includes::resolve::<PiggyBankEventTransformer>(params.include.as_deref())?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let journal = find_journal_by_transaction(user_id, transaction_id, &connection)?;
    let events = get_journal_piggy_bank_events(user_id, journal.id, &connection)?;

    let mut resources = Vec::with_capacity(events.len());
    let mut included = Vec::new();
    for event in &events {
        let mut resource = PiggyBankEventTransformer.resource(&state.serializer, event);

        if includes.contains("piggy_bank")
            && let Some(piggy_bank) = find_piggy_bank(user_id, event.piggy_bank_id, &connection)?
        {
            let piggy_bank = PiggyBankTransformer.resource(&state.serializer, &piggy_bank);
            resource.relate_one("piggy_bank", &piggy_bank);
            included.push(piggy_bank);
        }

        resources.push(resource);
    }

    let mut document = state.serializer.collection(resources);
    document.include(included);

    Ok(document)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::Value;
    use time::macros::date;

    use crate::{
        account::AccountType,
        attachment::{NewAttachment, create_attachment},
        endpoints::{self, format_endpoint},
        piggy_bank::{create_piggy_bank, create_piggy_bank_event},
        test_utils::{
            TEST_TOKEN, get_test_connection, get_test_server, insert_account, insert_test_user,
            insert_user, response_data, seed_withdrawal, withdrawal_data,
        },
        transaction::{JournalData, TransactionType, get_journal_transactions, store_journal},
    };

    fn url(endpoint: &str, transaction_id: i64) -> String {
        format!(
            "{}{}",
            endpoints::API_PREFIX,
            format_endpoint(endpoint, transaction_id)
        )
    }

    #[tokio::test]
    async fn withdrawal_shows_positive_leg() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let journal = seed_withdrawal(&conn, user.id, 12.5);
        let legs = get_journal_transactions(journal.id, &conn).unwrap();
        let (server, _) = get_test_server(conn);

        for leg in &legs {
            let response = server
                .get(&url(endpoints::TRANSACTION, leg.id))
                .authorization_bearer(TEST_TOKEN)
                .await;

            response.assert_status_ok();
            let data = response_data(&response);
            let data = data.as_array().unwrap();
            assert_eq!(data.len(), 1);
            assert_eq!(data[0]["attributes"]["amount"], 12.5);
            assert_eq!(data[0]["attributes"]["source_name"], "Checking");
            assert_eq!(data[0]["attributes"]["destination_name"], "Shop");
        }
    }

    #[tokio::test]
    async fn deposit_shows_negative_leg() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let employer = insert_account(&conn, user.id, "Employer", AccountType::Revenue);
        let checking = insert_account(&conn, user.id, "Checking", AccountType::Asset);
        let deposit = JournalData {
            transaction_type: TransactionType::Deposit,
            source_id: employer.id,
            destination_id: checking.id,
            ..withdrawal_data(&conn, user.id, 100.0)
        };
        let journal = store_journal(user.id, &deposit, &conn).unwrap();
        let legs = get_journal_transactions(journal.id, &conn).unwrap();
        let (server, _) = get_test_server(conn);

        let response = server
            .get(&url(endpoints::TRANSACTION, legs[1].id))
            .authorization_bearer(TEST_TOKEN)
            .await;

        let data = response_data(&response);
        assert_eq!(data.as_array().unwrap().len(), 1);
        assert_eq!(data[0]["attributes"]["amount"], -100.0);
        assert_eq!(data[0]["attributes"]["source_name"], "Employer");
    }

    #[tokio::test]
    async fn other_users_transaction_is_not_found() {
        let conn = get_test_connection();
        insert_test_user(&conn);
        let other = insert_user(&conn, "other@example.com", "other-token");
        let journal = seed_withdrawal(&conn, other.id, 12.5);
        let legs = get_journal_transactions(journal.id, &conn).unwrap();
        let (server, _) = get_test_server(conn);

        let response = server
            .get(&url(endpoints::TRANSACTION, legs[0].id))
            .authorization_bearer(TEST_TOKEN)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn show_includes_user_and_attachments() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let journal = seed_withdrawal(&conn, user.id, 12.5);
        let attachment = create_attachment(
            user.id,
            journal.id,
            NewAttachment {
                filename: "receipt.pdf".to_owned(),
                title: None,
                mime: "application/pdf".to_owned(),
                size: 2048,
            },
            &conn,
        )
        .unwrap();
        let legs = get_journal_transactions(journal.id, &conn).unwrap();
        let (server, _) = get_test_server(conn);

        let response = server
            .get(&format!(
                "{}?include=user,attachments",
                url(endpoints::TRANSACTION, legs[0].id)
            ))
            .authorization_bearer(TEST_TOKEN)
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let relationships = &body["data"][0]["relationships"];
        assert_eq!(relationships["user"]["data"]["id"], user.id.to_string());
        assert_eq!(
            relationships["attachments"]["data"][0]["id"],
            attachment.id.to_string()
        );
        let included_types: Vec<&str> = body["included"]
            .as_array()
            .unwrap()
            .iter()
            .map(|resource| resource["type"].as_str().unwrap())
            .collect();
        assert_eq!(included_types, vec!["attachments", "users"]);
    }

    #[tokio::test]
    async fn lists_attachments() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let journal = seed_withdrawal(&conn, user.id, 12.5);
        create_attachment(
            user.id,
            journal.id,
            NewAttachment {
                filename: "receipt.pdf".to_owned(),
                title: Some("Receipt".to_owned()),
                mime: "application/pdf".to_owned(),
                size: 2048,
            },
            &conn,
        )
        .unwrap();
        let legs = get_journal_transactions(journal.id, &conn).unwrap();
        let (server, _) = get_test_server(conn);

        let response = server
            .get(&url(endpoints::TRANSACTION_ATTACHMENTS, legs[0].id))
            .authorization_bearer(TEST_TOKEN)
            .await;

        response.assert_status_ok();
        let data = response_data(&response);
        assert_eq!(data[0]["type"], "attachments");
        assert_eq!(data[0]["attributes"]["filename"], "receipt.pdf");
        assert_eq!(data[0]["attributes"]["attachable_id"], journal.id);
    }

    #[tokio::test]
    async fn lists_piggy_bank_events_with_piggy_bank() {
        let conn = get_test_connection();
        let user = insert_test_user(&conn);
        let savings = insert_account(&conn, user.id, "Savings", AccountType::Asset);
        let piggy_bank = create_piggy_bank(user.id, savings.id, "Holiday", 500.0, &conn).unwrap();
        let journal = seed_withdrawal(&conn, user.id, 12.5);
        create_piggy_bank_event(&piggy_bank, Some(journal.id), -12.5, date!(2024 - 03 - 01), &conn)
            .unwrap();
        let legs = get_journal_transactions(journal.id, &conn).unwrap();
        let (server, _) = get_test_server(conn);

        let response = server
            .get(&format!(
                "{}?include=piggy_bank",
                url(endpoints::TRANSACTION_PIGGY_BANK_EVENTS, legs[0].id)
            ))
            .authorization_bearer(TEST_TOKEN)
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"][0]["type"], "piggy_bank_events");
        assert_eq!(body["data"][0]["attributes"]["piggy_bank_name"], "Holiday");
        assert_eq!(body["included"][0]["type"], "piggy_banks");
        assert_eq!(body["included"][0]["id"], piggy_bank.id.to_string());
    }

    #[tokio::test]
    async fn attachments_of_unknown_transaction_is_not_found() {
        let conn = get_test_connection();
        insert_test_user(&conn);
        let (server, _) = get_test_server(conn);

        let response = server
            .get(&url(endpoints::TRANSACTION_ATTACHMENTS, 999))
            .authorization_bearer(TEST_TOKEN)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
