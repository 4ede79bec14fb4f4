//! Driving port for reading bookings back for confirmation pages.

use async_trait::async_trait;

use crate::domain::{BookingId, BookingReceipt, Error, EventAvailability, EventId, VisitorId};

/// Driving port for booking reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingQuery: Send + Sync {
    /// Fetch one booking. When `viewer` is present it must own the booking.
    async fn get_booking(
        &self,
        booking_id: BookingId,
        viewer: Option<VisitorId>,
    ) -> Result<BookingReceipt, Error>;

    async fn list_visitor_bookings(&self, visitor_id: VisitorId)
    -> Result<Vec<BookingReceipt>, Error>;

    async fn event_availability(&self, event_id: EventId) -> Result<EventAvailability, Error>;
}
