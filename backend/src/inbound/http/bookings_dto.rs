//! Booking DTOs shared by the JSON API and the web-form adapter.
//!
//! Field names stay snake_case to match the form inputs existing clients
//! already submit.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::BookingFields;
use crate::domain::{
    BookingConfirmation, BookingReceipt, BookingTarget, EventAvailability, PaymentReceipt,
    PaymentRecord,
};

/// Request body for `POST /api/v1/bookings`.
///
/// Exactly one of `site_id` and `event_id` must be present. Guests supply
/// `name` and `email` instead of `visitor_id`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct BookingRequest {
    #[schema(example = 17)]
    pub visitor_id: Option<i64>,
    #[schema(example = "Rahim Uddin")]
    pub name: Option<String>,
    #[schema(example = "rahim@example.com")]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub site_id: Option<i64>,
    #[schema(example = 3)]
    pub event_id: Option<i64>,
    /// Defaults to 1.
    #[schema(example = 2)]
    pub no_of_tickets: Option<i64>,
    /// Defaults to the first accepted method.
    #[schema(example = "bkash")]
    pub payment_method: Option<String>,
}

impl From<BookingRequest> for BookingFields {
    fn from(value: BookingRequest) -> Self {
        Self {
            visitor_id: value.visitor_id,
            name: value.name,
            email: value.email,
            phone: value.phone,
            site_id: value.site_id,
            event_id: value.event_id,
            no_of_tickets: value.no_of_tickets,
            payment_method: value.payment_method,
        }
    }
}

/// Response body for a committed booking.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingCreatedResponse {
    pub success: bool,
    pub booking_id: i64,
    pub payment_id: i64,
    pub visitor_id: i64,
    /// Amount charged, two decimal places.
    #[schema(example = "1500.00")]
    pub amount: String,
    #[schema(example = "paid")]
    pub payment_status: String,
}

impl From<BookingConfirmation> for BookingCreatedResponse {
    fn from(value: BookingConfirmation) -> Self {
        Self {
            success: true,
            booking_id: value.booking_id.get(),
            payment_id: value.payment_id.get(),
            visitor_id: value.visitor_id.get(),
            amount: value.amount.to_string(),
            payment_status: value.payment_status.as_str().to_owned(),
        }
    }
}

/// Request body for `POST /api/v1/bookings/{booking_id}/payments`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct PaymentRequest {
    #[schema(example = "nagad")]
    pub payment_method: Option<String>,
}

/// Result of a payment attempt.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentReceiptResponse {
    pub booking_id: i64,
    pub payment_id: i64,
    #[schema(example = "1500.00")]
    pub amount: String,
    pub method: String,
    #[schema(example = "successful")]
    pub payment_status: String,
    #[schema(example = "paid")]
    pub booking_status: String,
    /// RFC 3339 timestamp, present once the payment succeeded.
    pub paid_at: Option<String>,
}

impl From<PaymentReceipt> for PaymentReceiptResponse {
    fn from(value: PaymentReceipt) -> Self {
        Self {
            booking_id: value.booking_id.get(),
            payment_id: value.payment_id.get(),
            amount: value.amount.to_string(),
            method: value.method,
            payment_status: value.payment_state.as_str().to_owned(),
            booking_status: value.booking_status.as_str().to_owned(),
            paid_at: value.paid_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Payment row embedded in a booking.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub payment_id: i64,
    pub amount: String,
    pub method: String,
    pub status: String,
    pub paid_at: Option<String>,
}

impl From<PaymentRecord> for PaymentResponse {
    fn from(value: PaymentRecord) -> Self {
        Self {
            payment_id: value.payment_id.get(),
            amount: value.amount.to_string(),
            method: value.method,
            status: value.status.as_str().to_owned(),
            paid_at: value.paid_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// A booking read back for confirmation pages.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    pub booking_id: i64,
    pub visitor_id: i64,
    pub site_id: Option<i64>,
    pub event_id: Option<i64>,
    pub no_of_tickets: u32,
    #[schema(example = "1500.00")]
    pub booked_ticket_price: String,
    #[schema(example = "pending")]
    pub payment_status: String,
    pub booking_date: String,
    pub payment: Option<PaymentResponse>,
}

impl From<BookingReceipt> for BookingResponse {
    fn from(value: BookingReceipt) -> Self {
        let (site_id, event_id) = match value.target {
            BookingTarget::Site(site) => (Some(site.get()), None),
            BookingTarget::Event(event) => (None, Some(event.get())),
        };
        Self {
            booking_id: value.booking_id.get(),
            visitor_id: value.visitor_id.get(),
            site_id,
            event_id,
            no_of_tickets: value.tickets.get(),
            booked_ticket_price: value.booked_ticket_price.to_string(),
            payment_status: value.payment_status.as_str().to_owned(),
            booking_date: value.booking_date.to_rfc3339(),
            payment: value.payment.map(PaymentResponse::from),
        }
    }
}

/// Seat accounting for an event.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventAvailabilityResponse {
    pub event_id: i64,
    pub capacity: u32,
    pub booked: u32,
    pub remaining: u32,
}

impl From<EventAvailability> for EventAvailabilityResponse {
    fn from(value: EventAvailability) -> Self {
        Self {
            event_id: value.event_id.get(),
            capacity: value.capacity,
            booked: value.booked,
            remaining: value.remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::{
        BookingId, BookingPaymentStatus, EventId, Money, PaymentId, PaymentState, SiteId,
        TicketCount, VisitorId,
    };

    fn receipt(target: BookingTarget) -> BookingReceipt {
        let booking_id = BookingId::new(9).expect("id");
        BookingReceipt {
            booking_id,
            visitor_id: VisitorId::new(4).expect("id"),
            target,
            tickets: TicketCount::new(3).expect("tickets"),
            booked_ticket_price: Money::from_minor(150_000).expect("money"),
            payment_status: BookingPaymentStatus::Pending,
            booking_date: Utc.with_ymd_and_hms(2026, 3, 21, 9, 0, 0).single().expect("date"),
            payment: Some(PaymentRecord {
                payment_id: PaymentId::new(11).expect("id"),
                booking_id,
                amount: Money::from_minor(150_000).expect("money"),
                method: "bkash".to_owned(),
                status: PaymentState::Initiated,
                paid_at: None,
            }),
        }
    }

    #[rstest]
    fn booking_response_splits_target_into_columns() {
        let event = BookingResponse::from(receipt(BookingTarget::Event(
            EventId::new(3).expect("id"),
        )));
        assert_eq!((event.site_id, event.event_id), (None, Some(3)));

        let site =
            BookingResponse::from(receipt(BookingTarget::Site(SiteId::new(5).expect("id"))));
        assert_eq!((site.site_id, site.event_id), (Some(5), None));
    }

    #[rstest]
    fn booking_response_renders_money_and_states_as_strings() {
        let value = serde_json::to_value(BookingResponse::from(receipt(BookingTarget::Event(
            EventId::new(3).expect("id"),
        ))))
        .expect("serialise");

        assert_eq!(value["booked_ticket_price"], json!("1500.00"));
        assert_eq!(value["payment_status"], json!("pending"));
        assert_eq!(value["payment"]["status"], json!("initiated"));
        assert_eq!(value["payment"]["paid_at"], Value::Null);
        assert_eq!(value["booking_date"], json!("2026-03-21T09:00:00+00:00"));
    }
}
