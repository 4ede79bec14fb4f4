//! Driving port for booking and payment mutations.
//!
//! Inbound adapters pass raw submitted fields plus the identity they resolved
//! from the session; the service owns validation against the active payment
//! method catalogue.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{
    BookingConfirmation, BookingId, BookingRequestParts, Error, PaymentOutcome, PaymentReceipt,
    Settlement, VisitorId,
};

/// Booking fields as submitted by a form or JSON body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookingFields {
    pub visitor_id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub site_id: Option<i64>,
    pub event_id: Option<i64>,
    pub no_of_tickets: Option<i64>,
    pub payment_method: Option<String>,
}

impl BookingFields {
    /// Borrow the fields for validation.
    pub fn as_parts(&self) -> BookingRequestParts<'_> {
        BookingRequestParts {
            visitor_id: self.visitor_id,
            name: self.name.as_deref(),
            email: self.email.as_deref(),
            phone: self.phone.as_deref(),
            site_id: self.site_id,
            event_id: self.event_id,
            no_of_tickets: self.no_of_tickets,
            payment_method: self.payment_method.as_deref(),
        }
    }
}

/// Request to create a booking and its initial payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBookingCommand {
    pub fields: BookingFields,
    pub settlement: Settlement,
}

/// Request to record a payment attempt for an existing booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentAttemptCommand {
    pub booking_id: BookingId,
    /// Requested method; `None` selects the catalogue default.
    pub method: Option<String>,
    pub outcome: PaymentOutcome,
    pub payer: Option<VisitorId>,
}

/// Driving port for booking writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingCommand: Send + Sync {
    /// Validate and atomically create a booking with its payment row.
    ///
    /// Fails with `invalid_request` before touching storage when the fields
    /// are ambiguous, incomplete or name an unknown payment method.
    async fn create_booking(
        &self,
        command: CreateBookingCommand,
    ) -> Result<BookingConfirmation, Error>;

    /// Record a payment attempt; a second payment for a paid booking is a
    /// `conflict` with `details.code = "already_paid"`.
    async fn record_payment(&self, command: PaymentAttemptCommand)
    -> Result<PaymentReceipt, Error>;

    /// Refund a paid booking.
    async fn refund_booking(&self, booking_id: BookingId) -> Result<PaymentReceipt, Error>;
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn fields_deserialise_from_snake_case_json() {
        let fields: BookingFields = serde_json::from_value(serde_json::json!({
            "email": "guest@example.com",
            "event_id": 5,
            "no_of_tickets": 3
        }))
        .expect("valid payload");

        let parts = fields.as_parts();
        assert_eq!(parts.email, Some("guest@example.com"));
        assert_eq!(parts.event_id, Some(5));
        assert_eq!(parts.no_of_tickets, Some(3));
        assert_eq!(parts.site_id, None);
    }
}
