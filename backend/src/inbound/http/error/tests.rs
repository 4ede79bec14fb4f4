//! Tests for HTTP error mapping.

use super::*;
use crate::domain::Error;
use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[fixture]
fn internal_error_case(expected_trace_id: String) -> Error {
    Error::internal("deadlock detected on bookings")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"secret": "x"}))
}

#[fixture]
fn capacity_case(expected_trace_id: String) -> Error {
    Error::capacity_exceeded("only 2 seats remain")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"code": "capacity_exceeded", "remaining": 2, "requested": 3}))
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::capacity_exceeded("full"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no session"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("already paid"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("offline"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
}

async fn assert_error_response(
    error: Error,
    expected_status: StatusCode,
    expected_trace_id: Option<&str>,
) -> Error {
    let response = ResponseError::error_response(&error);
    assert_eq!(response.status(), expected_status);

    let header = response.headers().get(TRACE_ID_HEADER);
    match expected_trace_id {
        Some(expected) => {
            let trace_id = header
                .expect("trace-id header is set by error_response")
                .to_str()
                .expect("trace-id not valid UTF-8");
            assert_eq!(trace_id, expected);
        }
        None => assert!(header.is_none(), "trace-id header should not be present"),
    }

    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");

    let mut payload: serde_json::Value =
        serde_json::from_slice(&bytes).expect("error body is JSON");
    let message = payload
        .as_object_mut()
        .and_then(|body| body.remove("error"))
        .expect("error field is present");
    assert_eq!(message, payload["message"], "error mirrors message");
    serde_json::from_value(payload).expect("Error JSON deserialisation succeeds")
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted(
    internal_error_case: Error,
    expected_trace_id: String,
) {
    let redacted = assert_error_response(
        internal_error_case,
        StatusCode::INTERNAL_SERVER_ERROR,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(redacted.code(), ErrorCode::InternalError);
    assert_eq!(redacted.message(), "Internal server error");
    assert!(redacted.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn capacity_errors_keep_remaining_seats(capacity_case: Error, expected_trace_id: String) {
    let payload = assert_error_response(
        capacity_case,
        StatusCode::BAD_REQUEST,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(payload.code(), ErrorCode::CapacityExceeded);
    assert_eq!(
        payload.details().and_then(|d| d.get("remaining")),
        Some(&json!(2))
    );
}

#[rstest]
#[actix_web::test]
async fn error_without_trace_id_omits_trace_header() {
    let error = Error::invalid_request("bad").with_details(json!({"field": "site_id"}));

    let payload = assert_error_response(error, StatusCode::BAD_REQUEST, None).await;
    assert_eq!(payload.code(), ErrorCode::InvalidRequest);
    assert_eq!(payload.trace_id(), None);
    assert_eq!(payload.details(), Some(&json!({"field": "site_id"})));
}

#[rstest]
#[actix_web::test]
async fn json_body_exposes_message_as_error_field() {
    let response = ResponseError::error_response(&Error::capacity_exceeded("only 2 seats remain"));
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("error body is JSON");

    assert_eq!(payload["error"], json!("only 2 seats remain"));
    assert_eq!(payload["message"], json!("only 2 seats remain"));
    assert_eq!(payload["code"], json!("capacity_exceeded"));
}

#[rstest]
#[case(Error::conflict("booking is already paid"), StatusCode::CONFLICT, "booking is already paid")]
#[case(Error::internal("connection reset"), StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")]
#[actix_web::test]
async fn plaintext_responses_share_status_and_redaction(
    #[case] error: Error,
    #[case] status: StatusCode,
    #[case] body: &str,
) {
    let response = plaintext_error_response(&error);
    assert_eq!(response.status(), status);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    assert_eq!(bytes, body.as_bytes());
}

#[test]
fn from_actix_error_is_redacted_internal_error() {
    use actix_web::error;

    let actix_err = error::ErrorBadRequest("boom");
    let err: Error = actix_err.into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.trace_id(), None);
    assert_eq!(err.details(), None);
}
