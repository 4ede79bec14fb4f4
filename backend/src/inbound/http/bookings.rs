//! Booking JSON API handlers.
//!
//! ```text
//! POST /api/v1/bookings
//! GET  /api/v1/bookings/{booking_id}
//! POST /api/v1/bookings/{booking_id}/payments
//! GET  /api/v1/visitors/me/bookings
//! ```
//!
//! The caller's identity comes from the session only. A session visitor id
//! overrides any `visitor_id` in the body, and without a session the body
//! value is ignored. A booking only seeds the session when it created the
//! guest visitor; reusing a visitor by email grants no identity.

use actix_web::{get, post, web};
use tracing::debug;

use crate::domain::ports::{BookingFields, CreateBookingCommand, PaymentAttemptCommand};
use crate::domain::{BookingConfirmation, BookingId, PaymentOutcome};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bookings_dto::{
    BookingCreatedResponse, BookingRequest, BookingResponse, PaymentReceiptResponse,
    PaymentRequest,
};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{BOOKING_ID, parse_id};

/// Merge the session identity into submitted booking fields.
pub(crate) fn apply_session_identity(
    mut fields: BookingFields,
    session: &SessionContext,
) -> ApiResult<BookingFields> {
    match session.visitor_id()? {
        Some(visitor_id) => {
            if fields.visitor_id.is_some_and(|raw| raw != visitor_id.get()) {
                debug!(%visitor_id, "ignoring body visitor_id in favour of session");
            }
            fields.visitor_id = Some(visitor_id.get());
        }
        None => {
            if fields.visitor_id.take().is_some() {
                debug!("ignoring body visitor_id without a session");
            }
        }
    }
    Ok(fields)
}

/// Store the visitor in the session when this booking created it.
pub(crate) fn remember_new_visitor(
    session: &SessionContext,
    confirmation: &BookingConfirmation,
) -> ApiResult<()> {
    if confirmation.visitor_created {
        session.persist_visitor(confirmation.visitor_id)?;
    }
    Ok(())
}

/// Create a booking and its initial payment in one transaction.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    request_body = BookingRequest,
    responses(
        (status = 200, description = "Booking created", body = BookingCreatedResponse),
        (status = 400, description = "Invalid request or not enough seats", body = ErrorSchema),
        (status = 404, description = "Site, event or visitor not found", body = ErrorSchema),
        (status = 503, description = "Booking store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "createBooking",
    security([])
)]
#[post("/bookings")]
pub async fn create_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<BookingRequest>,
) -> ApiResult<web::Json<BookingCreatedResponse>> {
    let fields = apply_session_identity(payload.into_inner().into(), &session)?;
    let confirmation = state
        .bookings
        .create_booking(CreateBookingCommand {
            fields,
            settlement: state.api_settlement,
        })
        .await?;
    remember_new_visitor(&session, &confirmation)?;
    Ok(web::Json(confirmation.into()))
}

/// Read a booking back with its payment row.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{booking_id}",
    params(("booking_id" = i64, Path, description = "Booking identifier")),
    responses(
        (status = 200, description = "Booking", body = BookingResponse),
        (status = 400, description = "Invalid booking id", body = ErrorSchema),
        (status = 403, description = "Booking belongs to another visitor", body = ErrorSchema),
        (status = 404, description = "Booking not found", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "getBooking"
)]
#[get("/bookings/{booking_id}")]
pub async fn get_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<BookingResponse>> {
    let booking_id: BookingId = parse_id(path.into_inner(), BOOKING_ID)?;
    let viewer = session.visitor_id()?;
    let receipt = state.bookings_query.get_booking(booking_id, viewer).await?;
    Ok(web::Json(receipt.into()))
}

/// Pay for an existing pending booking.
///
/// The attempt is recorded as successful. Paying an already paid booking is
/// a `409` with `details.code = "already_paid"` and changes nothing.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{booking_id}/payments",
    params(("booking_id" = i64, Path, description = "Booking identifier")),
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "Payment recorded", body = PaymentReceiptResponse),
        (status = 400, description = "Invalid method or amount", body = ErrorSchema),
        (status = 403, description = "Booking belongs to another visitor", body = ErrorSchema),
        (status = 404, description = "Booking not found", body = ErrorSchema),
        (status = 409, description = "Booking already paid or refunded", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "payBooking"
)]
#[post("/bookings/{booking_id}/payments")]
pub async fn pay_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
    payload: web::Json<PaymentRequest>,
) -> ApiResult<web::Json<PaymentReceiptResponse>> {
    let booking_id: BookingId = parse_id(path.into_inner(), BOOKING_ID)?;
    let receipt = state
        .bookings
        .record_payment(PaymentAttemptCommand {
            booking_id,
            method: payload.into_inner().payment_method,
            outcome: PaymentOutcome::Successful,
            payer: session.visitor_id()?,
        })
        .await?;
    Ok(web::Json(receipt.into()))
}

/// List the session visitor's bookings, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/visitors/me/bookings",
    responses(
        (status = 200, description = "Bookings", body = [BookingResponse]),
        (status = 401, description = "No visitor in session", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "listMyBookings"
)]
#[get("/visitors/me/bookings")]
pub async fn list_my_bookings(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<BookingResponse>>> {
    let visitor_id = session.require_visitor_id()?;
    let bookings = state
        .bookings_query
        .list_visitor_bookings(visitor_id)
        .await?;
    Ok(web::Json(
        bookings.into_iter().map(BookingResponse::from).collect(),
    ))
}

#[cfg(test)]
#[path = "bookings_tests.rs"]
mod tests;
