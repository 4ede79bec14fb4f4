//! Web-form adapter for browsers posting urlencoded forms.
//!
//! ```text
//! POST /bookings                    -> 303 /payments/{booking_id}/status
//! POST /payments                    -> 303 /payments/{booking_id}/status
//! GET  /payments/{booking_id}/status
//! ```
//!
//! Failures are answered with a plaintext message and the same status codes
//! as the JSON API. Bookings created here always defer payment.

use std::fmt::Write as _;

use actix_web::http::header;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::ports::{BookingFields, CreateBookingCommand, PaymentAttemptCommand};
use crate::domain::{BookingId, BookingReceipt, Error, PaymentOutcome, Settlement};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bookings::{apply_session_identity, remember_new_visitor};
use crate::inbound::http::error::plaintext_error_response;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    BOOKING_ID, EVENT_ID, NO_OF_TICKETS, SITE_ID, VISITOR_ID, parse_id, parse_optional_integer,
    require_id,
};

/// Fields posted by the booking form. Numbers arrive as text.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BookingForm {
    pub visitor_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub site_id: Option<String>,
    pub event_id: Option<String>,
    pub no_of_tickets: Option<String>,
    pub method: Option<String>,
}

impl BookingForm {
    fn into_fields(self) -> ApiResult<BookingFields> {
        Ok(BookingFields {
            visitor_id: parse_optional_integer(self.visitor_id.as_deref(), VISITOR_ID)?,
            name: self.name,
            email: self.email,
            phone: self.phone,
            site_id: parse_optional_integer(self.site_id.as_deref(), SITE_ID)?,
            event_id: parse_optional_integer(self.event_id.as_deref(), EVENT_ID)?,
            no_of_tickets: parse_optional_integer(self.no_of_tickets.as_deref(), NO_OF_TICKETS)?,
            payment_method: self.method,
        })
    }
}

/// Fields posted by the pay-later form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaymentForm {
    pub booking_id: Option<String>,
    pub method: Option<String>,
}

fn status_location(booking_id: BookingId) -> String {
    format!("/payments/{booking_id}/status")
}

fn see_other(booking_id: BookingId) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, status_location(booking_id)))
        .finish()
}

fn reply(result: ApiResult<HttpResponse>) -> HttpResponse {
    result.unwrap_or_else(|error| plaintext_error_response(&error))
}

async fn book(
    state: &HttpState,
    session: &SessionContext,
    form: BookingForm,
) -> ApiResult<HttpResponse> {
    let fields = apply_session_identity(form.into_fields()?, session)?;
    let confirmation = state
        .bookings
        .create_booking(CreateBookingCommand {
            fields,
            settlement: Settlement::Deferred,
        })
        .await?;
    remember_new_visitor(session, &confirmation)?;
    Ok(see_other(confirmation.booking_id))
}

/// Handle the booking form.
#[post("/bookings")]
pub async fn submit_booking_form(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<BookingForm>,
) -> HttpResponse {
    reply(book(&state, &session, form.into_inner()).await)
}

async fn pay(
    state: &HttpState,
    session: &SessionContext,
    form: PaymentForm,
) -> ApiResult<HttpResponse> {
    let raw_id = parse_optional_integer(form.booking_id.as_deref(), BOOKING_ID)?;
    let booking_id: BookingId = require_id(raw_id, BOOKING_ID)?;
    let attempt = PaymentAttemptCommand {
        booking_id,
        method: form.method,
        outcome: PaymentOutcome::Successful,
        payer: session.visitor_id()?,
    };
    match state.bookings.record_payment(attempt).await {
        Ok(_) => Ok(see_other(booking_id)),
        Err(error) if error.detail_code() == Some("already_paid") => {
            info!(%booking_id, "repeat payment submission ignored");
            Ok(see_other(booking_id))
        }
        Err(error) => Err(error),
    }
}

/// Handle the pay-later form. Re-submitting for a paid booking redirects to
/// the status page without touching the payment.
#[post("/payments")]
pub async fn submit_payment_form(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<PaymentForm>,
) -> HttpResponse {
    reply(pay(&state, &session, form.into_inner()).await)
}

fn render_status(receipt: &BookingReceipt) -> Result<String, Error> {
    let mut page = String::new();
    let render_failed = |_| Error::internal("failed to render status page");
    writeln!(page, "Booking {}", receipt.booking_id).map_err(render_failed)?;
    writeln!(page, "Target: {}", receipt.target).map_err(render_failed)?;
    writeln!(page, "Tickets: {}", receipt.tickets.get()).map_err(render_failed)?;
    writeln!(page, "Amount: {}", receipt.booked_ticket_price).map_err(render_failed)?;
    writeln!(page, "Booking status: {}", receipt.payment_status).map_err(render_failed)?;
    match &receipt.payment {
        Some(payment) => {
            write!(page, "Payment: {} via {}", payment.status, payment.method)
                .map_err(render_failed)?;
            if let Some(paid_at) = payment.paid_at {
                write!(page, " at {}", paid_at.to_rfc3339()).map_err(render_failed)?;
            }
            writeln!(page).map_err(render_failed)?;
        }
        None => writeln!(page, "Payment: none").map_err(render_failed)?,
    }
    Ok(page)
}

async fn status(
    state: &HttpState,
    session: &SessionContext,
    raw_id: i64,
) -> ApiResult<HttpResponse> {
    let booking_id: BookingId = parse_id(raw_id, BOOKING_ID)?;
    let receipt = state
        .bookings_query
        .get_booking(booking_id, session.visitor_id()?)
        .await?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(render_status(&receipt)?))
}

/// Plaintext payment status page.
#[get("/payments/{booking_id}/status")]
pub async fn payment_status_page(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> HttpResponse {
    reply(status(&state, &session, path.into_inner()).await)
}

#[cfg(test)]
#[path = "booking_form_tests.rs"]
mod tests;
