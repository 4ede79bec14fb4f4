//! Driven port for the booking and payment store.
//!
//! Every mutating method is one atomic unit of work: adapters either commit
//! all rows it touches or none. Adapters own concurrency control, so two
//! concurrent `create_booking` calls for the same event must never seat more
//! visitors than the event's capacity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    BookingConfirmation, BookingId, BookingReceipt, BookingTarget, CreateBookingRequest,
    EventAvailability,
    EventId, GuestPasswordPlaceholder, PaymentReceipt, RecordPaymentRequest, VisitorId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by booking repository adapters.
    pub enum BookingRepositoryError {
        /// The referenced site or event does not exist.
        TargetNotFound { target: String } => "{target} does not exist",
        /// An explicit visitor id did not match any visitor.
        VisitorNotFound { visitor_id: i64 } => "visitor {visitor_id} does not exist",
        /// The booking does not exist.
        BookingNotFound { booking_id: i64 } => "booking {booking_id} does not exist",
        /// The event cannot seat the requested tickets.
        CapacityExceeded { remaining: u32, requested: u32 } =>
            "only {remaining} seats remain but {requested} were requested",
        /// The booking has already been paid; nothing was changed.
        AlreadyPaid => "booking is already paid",
        /// The booking is not in a state that allows the operation.
        InvalidState { status: String } => "booking is {status}",
        /// The computed charge is zero, negative or overflowed.
        InvalidAmount { message: String } => "invalid payment amount: {message}",
        /// The caller does not own the booking.
        PayerMismatch => "booking belongs to another visitor",
        /// Repository connection could not be established.
        Connection { message: String } => "booking repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "booking repository query failed: {message}",
    }
}

/// Inputs for the booking transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub request: CreateBookingRequest,
    /// Placeholder stored if a guest visitor row has to be created.
    pub guest_password: GuestPasswordPlaceholder,
    pub booked_at: DateTime<Utc>,
}

/// Inputs for a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentAttempt {
    pub request: RecordPaymentRequest,
    pub attempted_at: DateTime<Utc>,
}

/// Port for the transactional booking workflow and its read paths.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Resolve the visitor, check capacity, lock the price and insert the
    /// booking with its single payment row.
    async fn create_booking(
        &self,
        booking: &NewBooking,
    ) -> Result<BookingConfirmation, BookingRepositoryError>;

    /// Insert or update the booking's payment row with the attempt outcome.
    async fn record_payment(
        &self,
        attempt: &PaymentAttempt,
    ) -> Result<PaymentReceipt, BookingRepositoryError>;

    /// Move a paid booking and its successful payment to `refunded`.
    async fn refund_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<PaymentReceipt, BookingRepositoryError>;

    /// Whether the site or event exists.
    async fn target_exists(&self, target: BookingTarget) -> Result<bool, BookingRepositoryError>;

    async fn find_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<BookingReceipt>, BookingRepositoryError>;

    /// Bookings for a visitor, newest first.
    async fn list_bookings_for_visitor(
        &self,
        visitor_id: VisitorId,
    ) -> Result<Vec<BookingReceipt>, BookingRepositoryError>;

    /// Seat accounting for an event; `None` when the event does not exist.
    async fn event_availability(
        &self,
        event_id: EventId,
    ) -> Result<Option<EventAvailability>, BookingRepositoryError>;
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn capacity_error_reports_remaining_seats() {
        let err = BookingRepositoryError::capacity_exceeded(0_u32, 1_u32);
        assert_eq!(
            err,
            BookingRepositoryError::CapacityExceeded {
                remaining: 0,
                requested: 1
            }
        );
        assert!(err.to_string().contains("only 0 seats remain"));
    }

    #[rstest]
    fn target_errors_name_the_target() {
        let err = BookingRepositoryError::target_not_found("event 7");
        assert_eq!(err.to_string(), "event 7 does not exist");
    }

    #[rstest]
    fn query_error_formats_message() {
        let err = BookingRepositoryError::query("deadlock detected");
        assert!(err.to_string().contains("deadlock detected"));
    }
}
