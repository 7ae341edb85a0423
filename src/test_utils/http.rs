use axum::http::header::CONTENT_TYPE;
use axum_test::TestResponse;
use serde_json::Value;

use crate::json_api::JSON_API_CONTENT_TYPE;

#[track_caller]
pub(crate) fn assert_json_api(response: &TestResponse) {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .expect("content-type header missing");
    assert_eq!(content_type, JSON_API_CONTENT_TYPE);
}

/// The `data` member of a JSON:API response body.
#[track_caller]
pub(crate) fn response_data(response: &TestResponse) -> Value {
    assert_json_api(response);
    let body: Value = response.json();

    body.get("data").cloned().expect("response has no data member")
}
